use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use papatch::app::{self, Credentials};
use papatch::cli::Cli;
use papatch::config::Config;
use papatch::prompt::Prompter;
use papatch::ui::SyncTracker;
use papatch::{EXIT_INTERRUPTED, init_tracing};
use papatch_sync::{Outcome, SyncError};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match try_main(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn try_main(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = Config::load(&cli).context("failed to load configuration")?;
    if cli.print_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(ExitCode::SUCCESS);
    }

    cli.check_unattended()?;
    let credentials = Credentials::resolve(&cli, &Prompter::default()).context("failed to read credentials")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let tracker = SyncTracker::new();

    let outcome = runtime.block_on(async {
        tokio::select! {
            outcome = app::run(&cli, &config, credentials, tracker.clone()) => outcome,
            _ = tokio::signal::ctrl_c() => Ok(Outcome::Failed(SyncError::Interrupted)),
        }
    });
    tracker.finish();
    // aborted downloads drop their staged files while the runtime winds down
    runtime.shutdown_timeout(Duration::from_secs(2));

    Ok(match outcome? {
        Outcome::Synced(report) => {
            println!(
                "* Successfully updated stream '{}' ({} bundle(s), {} bytes, {} purged).",
                report.stream, report.fetched, report.bytes_downloaded, report.purged
            );
            ExitCode::SUCCESS
        }
        Outcome::Failed(SyncError::Interrupted) => {
            eprintln!("! Interrupted.");
            ExitCode::from(EXIT_INTERRUPTED)
        }
        Outcome::Failed(e) => {
            tracing::error!("{:#}", anyhow::Error::new(e));
            ExitCode::FAILURE
        }
    })
}
