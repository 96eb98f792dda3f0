//! One run of the patcher, from login to a terminal outcome.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use papatch_archive::ExtractOptions;
use papatch_fetch::{ClientSetting, FetchOptions};
use papatch_manifest::Stream;
use papatch_sync::{
    Orchestrator, Outcome, StreamCatalog, StreamSelected, SyncError, SyncOptions, WorkerPool, open_catalog,
};
use tracing::info;

use crate::cli::Cli;
use crate::config::Config;
use crate::prompt::Prompter;
use crate::ubernet::UberNet;
use crate::ui::SyncTracker;

#[derive(Clone)]
pub struct Credentials {
    pub ubername: String,
    pub password: String,
}

impl Credentials {
    /// Take credentials from flags, asking for whatever is missing.
    pub fn resolve(cli: &Cli, prompter: &Prompter) -> std::io::Result<Self> {
        let ubername = match &cli.ubername {
            Some(name) => name.clone(),
            None => prompter.ask("UberName")?,
        };
        let password = match &cli.password {
            Some(password) => password.clone(),
            None => prompter.ask_secret("Password")?,
        };
        Ok(Self { ubername, password })
    }
}

pub fn sync_options(cli: &Cli, config: &Config, tracker: &Arc<SyncTracker>) -> SyncOptions {
    SyncOptions {
        full: cli.full,
        fetch_pool: WorkerPool::new(config.threads),
        verify_pool: WorkerPool::new(config.verify_threads),
        fetch: FetchOptions::default()
            .rate_limit(config.rate_limit)
            .progress_callback(Some(tracker.fetch_callback())),
        extract: ExtractOptions::default().progress_callback(Some(tracker.extract_callback())),
    }
}

/// Pick the requested stream, or ask for one when running interactively.
async fn choose_stream(cli: &Cli, catalog: StreamCatalog) -> Result<Stream, SyncError> {
    if let Some(name) = &cli.stream
        && (catalog.get(name).is_some() || cli.unattended)
    {
        return catalog.select(name);
    }

    let names: Vec<String> = catalog.names().map(str::to_owned).collect();
    let choice = tokio::task::spawn_blocking(move || Prompter::default().choose(&names))
        .await?
        .map_err(|e| SyncError::StreamListUnavailable(Box::new(e)))?;
    catalog.select(&choice)
}

pub async fn run(cli: &Cli, config: &Config, credentials: Credentials, tracker: Arc<SyncTracker>) -> anyhow::Result<Outcome> {
    let client = ClientSetting {
        connect_timeout: Some(Duration::from_secs(config.connect_timeout_secs)),
        max_redirects: config.max_redirects,
        ..ClientSetting::default()
    }
    .build()
    .context("failed to build HTTP client")?;

    let ubernet = UberNet::new(
        client.inner().clone(),
        config.service_url(),
        credentials.ubername,
        credentials.password,
    );

    info!(host = %config.host, "logging in");
    let stream = match open_catalog(&ubernet).await {
        Ok(catalog) => choose_stream(cli, catalog).await,
        Err(e) => Err(e),
    };
    let stream = match stream {
        Ok(stream) => stream,
        Err(e) => return Ok(Outcome::Failed(e)),
    };

    info!(stream = %stream.name, game_root = %config.game_root.display(), "patching installation");
    let orchestrator = Orchestrator::new(
        client,
        config.cache_root(),
        config.game_root.clone(),
        sync_options(cli, config, &tracker),
    );
    let outcome = orchestrator.run(StreamSelected::new(stream)).await;
    tracker.finish();
    Ok(outcome)
}
