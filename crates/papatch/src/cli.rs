use std::path::PathBuf;

use clap::Parser;

/// Synchronize a Planetary Annihilation installation with an UberNet stream.
#[derive(Parser, Debug, Default)]
#[command(name = "papatch", version, about, long_about = None)]
pub struct Cli {
    /// UberName used for login.
    #[arg(short, long)]
    pub ubername: Option<String>,

    /// Password used for login.
    #[arg(short, long)]
    pub password: Option<String>,

    /// Stream to download.
    #[arg(short, long)]
    pub stream: Option<String>,

    /// Purge the cache and patch even unchanged files.
    #[arg(short, long)]
    pub full: bool,

    /// Download and extraction workers.
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Limit each download to this many bytes/sec (0 = unlimited).
    #[arg(short = 'r', long = "ratelimit")]
    pub rate_limit: Option<u64>,

    /// Workers hashing cached bundles.
    #[arg(long)]
    pub verify_threads: Option<usize>,

    /// Connect timeout in seconds.
    #[arg(long = "connect-timeout", value_name = "SECS")]
    pub connect_timeout_secs: Option<u64>,

    /// Installation root; streams are installed in subdirectories.
    #[arg(long)]
    pub game_root: Option<PathBuf>,

    /// Bundle cache root.
    #[arg(long)]
    pub cache_root: Option<PathBuf>,

    /// Configuration file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Don't ask any questions. Requires --ubername, --password and --stream.
    #[arg(long)]
    pub unattended: bool,

    /// Print the effective configuration and exit.
    #[arg(long)]
    pub print_config: bool,

    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unattended mode needs {}", .missing.join(", "))]
pub struct MissingArguments {
    pub missing: Vec<&'static str>,
}

impl Cli {
    /// In unattended mode every question must already be answered.
    pub fn check_unattended(&self) -> Result<(), MissingArguments> {
        if !self.unattended {
            return Ok(());
        }

        let missing: Vec<&'static str> = [
            ("--ubername", self.ubername.is_none()),
            ("--password", self.password.is_none()),
            ("--stream", self.stream.is_none()),
        ]
        .into_iter()
        .filter_map(|(flag, absent)| absent.then_some(flag))
        .collect();

        if missing.is_empty() { Ok(()) } else { Err(MissingArguments { missing }) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_short_flags() {
        let cli = Cli::try_parse_from([
            "papatch", "-u", "pilot", "-p", "hunter2", "-s", "stable", "-f", "-t", "8", "-r", "1024",
        ])
        .unwrap();
        assert_eq!(cli.ubername.as_deref(), Some("pilot"));
        assert_eq!(cli.password.as_deref(), Some("hunter2"));
        assert_eq!(cli.stream.as_deref(), Some("stable"));
        assert!(cli.full);
        assert_eq!(cli.threads, Some(8));
        assert_eq!(cli.rate_limit, Some(1024));
    }

    #[test]
    fn cli_parse_long_flags() {
        let cli = Cli::try_parse_from([
            "papatch",
            "--verify-threads",
            "2",
            "--connect-timeout",
            "10",
            "--game-root",
            "/games/pa",
            "--config",
            "papatch.toml",
            "--print-config",
        ])
        .unwrap();
        assert_eq!(cli.verify_threads, Some(2));
        assert_eq!(cli.connect_timeout_secs, Some(10));
        assert_eq!(cli.game_root, Some(PathBuf::from("/games/pa")));
        assert_eq!(cli.config, Some(PathBuf::from("papatch.toml")));
        assert!(cli.print_config);
    }

    #[test]
    fn cli_parse_verbose_levels() {
        for (args, level) in [(vec!["papatch"], 0), (vec!["papatch", "-v"], 1), (vec!["papatch", "-vvv"], 3)] {
            assert_eq!(Cli::try_parse_from(args).unwrap().verbose, level);
        }
    }

    #[test]
    fn unattended_requires_everything() {
        let cli = Cli::try_parse_from(["papatch", "--unattended", "-u", "pilot"]).unwrap();
        assert_eq!(
            cli.check_unattended(),
            Err(MissingArguments {
                missing: vec!["--password", "--stream"]
            })
        );

        let cli = Cli::try_parse_from(["papatch", "--unattended", "-u", "a", "-p", "b", "-s", "stable"]).unwrap();
        assert!(cli.check_unattended().is_ok());

        let cli = Cli::try_parse_from(["papatch", "-u", "pilot"]).unwrap();
        assert!(cli.check_unattended().is_ok());
    }
}
