use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

pub const ENV_PREFIX: &str = "PAPATCH_";

/// Effective settings after layering defaults, file, environment and flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub game_root: PathBuf,
    /// Defaults to `<game_root>/.cache` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_root: Option<PathBuf>,
    pub host: String,
    pub threads: usize,
    pub verify_threads: usize,
    /// Bytes/sec per download, 0 for unlimited.
    pub rate_limit: u64,
    pub connect_timeout_secs: u64,
    pub max_redirects: usize,
}

impl Default for Config {
    fn default() -> Self {
        let home = home::home_dir().unwrap_or_default();
        let cpus = papatch_sync::available_parallelism().get();

        Self {
            game_root: home.join(".local").join("Uber Entertainment").join("PA"),
            cache_root: None,
            host: "uberent.com".to_owned(),
            threads: cpus,
            verify_threads: cpus,
            rate_limit: 0,
            connect_timeout_secs: 30,
            max_redirects: 5,
        }
    }
}

/// Flag values that override everything else. Unset flags leave lower
/// layers alone.
#[derive(Debug, Default, Serialize)]
struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    game_root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    threads: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    verify_threads: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rate_limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    connect_timeout_secs: Option<u64>,
}

impl From<&Cli> for Overrides {
    fn from(cli: &Cli) -> Self {
        Self {
            game_root: cli.game_root.clone(),
            cache_root: cli.cache_root.clone(),
            threads: cli.threads,
            verify_threads: cli.verify_threads,
            rate_limit: cli.rate_limit,
            connect_timeout_secs: cli.connect_timeout_secs,
        }
    }
}

impl Config {
    /// `$HOME/.config/papatch/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        home::home_dir().map(|home| home.join(".config").join("papatch").join("config.toml"))
    }

    /// Defaults, then the config file (a missing file is skipped), then
    /// `PAPATCH_*` variables, then flags.
    pub fn figment(cli: &Cli) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = cli.config.clone().or_else(Self::default_path) {
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(Overrides::from(cli)))
    }

    pub fn load(cli: &Cli) -> Result<Self, figment::Error> {
        Self::figment(cli).extract()
    }

    pub fn cache_root(&self) -> PathBuf {
        self.cache_root.clone().unwrap_or_else(|| self.game_root.join(".cache"))
    }

    pub fn game_root(&self) -> &Path {
        &self.game_root
    }

    /// Base URL of the login service. A bare host means HTTPS.
    pub fn service_url(&self) -> String {
        if self.host.contains("://") {
            self.host.trim_end_matches('/').to_owned()
        } else {
            format!("https://{}", self.host)
        }
    }
}
