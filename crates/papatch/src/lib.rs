//! Command-line front end for the patch synchronizer.

pub mod app;
pub mod cli;
pub mod config;
pub mod prompt;
pub mod ubernet;
pub mod ui;

use tracing_subscriber::EnvFilter;

/// Exit status for a run cut short by Ctrl-C.
pub const EXIT_INTERRUPTED: u8 = 130;

/// Map `-v` occurrences to a filter; `RUST_LOG` wins when set.
pub fn env_filter(verbose: u8) -> EnvFilter {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

pub fn init_tracing(verbose: u8) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
