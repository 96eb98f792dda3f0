//! The run state machine.
//!
//! ```text
//! StreamSelected --load_manifest--> ManifestLoaded --verify--> Verified --apply--> Synced
//!        \___________________________\____________________________\______________> Failed
//! ```
//!
//! Each state owns exactly the data valid at that point and is consumed by the
//! transition out of it, so steps cannot be skipped or repeated.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use papatch_archive::{ExtractOptions, ExtractReport, Extractor};
use papatch_fetch::{FetchOptions, FetchReport, Fetcher, HttpClient};
use papatch_manifest::{Bundle, Manifest, Stream};
use papatch_store::CacheStore;
use tracing::{debug, error, info, warn};

use crate::error::{Result, SyncError};
use crate::pool::WorkerPool;
use crate::session::StreamCatalog;
use crate::verify::{VerifyReport, Verifier};

/// Knobs for one run.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Purge the stream's whole cache and refetch everything.
    pub full: bool,
    /// Workers for downloads and for extraction.
    pub fetch_pool: WorkerPool,
    /// Workers hashing cached blobs.
    pub verify_pool: WorkerPool,
    pub fetch: FetchOptions,
    pub extract: ExtractOptions,
}

/// Totals of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub stream: String,
    pub purged: usize,
    pub fetched: usize,
    pub extracted_entries: usize,
    pub bytes_downloaded: u64,
}

/// Terminal state of a run.
#[derive(Debug)]
pub enum Outcome {
    Synced(SyncReport),
    Failed(SyncError),
}

impl Outcome {
    pub fn is_synced(&self) -> bool {
        matches!(self, Self::Synced(_))
    }

    pub fn into_result(self) -> Result<SyncReport> {
        match self {
            Self::Synced(report) => Ok(report),
            Self::Failed(err) => Err(err),
        }
    }
}

impl From<Result<SyncReport>> for Outcome {
    fn from(result: Result<SyncReport>) -> Self {
        match result {
            Ok(report) => Self::Synced(report),
            Err(err) => Self::Failed(err),
        }
    }
}

/// A stream has been chosen; nothing is known about its content yet.
#[derive(Debug, Clone)]
pub struct StreamSelected {
    stream: Stream,
}

impl StreamSelected {
    pub fn new(stream: Stream) -> Self {
        Self { stream }
    }

    pub fn from_catalog(catalog: StreamCatalog, name: &str) -> Result<Self> {
        catalog.select(name).map(Self::new)
    }

    pub fn stream(&self) -> &Stream {
        &self.stream
    }
}

/// The stream's manifest has been downloaded and decoded.
#[derive(Debug)]
pub struct ManifestLoaded {
    stream: Stream,
    manifest: Manifest,
}

impl ManifestLoaded {
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }
}

/// The cache has been reconciled; only the bundles still to fetch remain.
#[derive(Debug)]
pub struct Verified {
    stream: Stream,
    purged: usize,
    needed: Vec<Bundle>,
}

impl Verified {
    pub fn needed(&self) -> &[Bundle] {
        &self.needed
    }

    pub fn purged(&self) -> usize {
        self.purged
    }
}

/// Drives streams through verify, fetch and extract.
pub struct Orchestrator<C: HttpClient> {
    fetcher: Arc<Fetcher<C>>,
    verifier: Verifier,
    extractor: Arc<Extractor>,
    options: SyncOptions,
}

impl<C: HttpClient + 'static> Orchestrator<C> {
    pub fn new(client: C, cache_root: impl Into<PathBuf>, install_root: impl Into<PathBuf>, options: SyncOptions) -> Self {
        let store = CacheStore::new(cache_root);
        let fetcher = Fetcher::new(client, store.clone()).with_options(options.fetch.clone());
        let extractor = Extractor::new(install_root).with_options(options.extract.clone());

        Self {
            fetcher: Arc::new(fetcher),
            verifier: Verifier::new(store, options.verify_pool),
            extractor: Arc::new(extractor),
            options,
        }
    }

    pub fn store(&self) -> &CacheStore {
        self.fetcher.store()
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    pub async fn load_manifest(&self, state: StreamSelected) -> Result<ManifestLoaded> {
        let StreamSelected { stream } = state;
        if !papatch_fs::is_plain_name(&stream.name) {
            return Err(SyncError::InvalidStreamName { name: stream.name });
        }
        let url = stream.manifest_url();

        let raw = self
            .fetcher
            .client()
            .get_bytes(&url)
            .await
            .map_err(|e| SyncError::ManifestUnavailable {
                url: url.clone(),
                source: Box::new(e),
            })?;
        let manifest = Manifest::from_gzip_json(&raw)?;

        info!(
            stream = %stream.name,
            bundles = manifest.bundles.len(),
            size = manifest.total_size(),
            "manifest loaded"
        );
        Ok(ManifestLoaded { stream, manifest })
    }

    pub async fn verify(&self, state: ManifestLoaded) -> Result<Verified> {
        let ManifestLoaded { stream, manifest } = state;
        let VerifyReport { purged, needed } = self
            .verifier
            .verify(&stream.name, &manifest, self.options.full)
            .await?;

        Ok(Verified { stream, purged, needed })
    }

    /// Fetch every needed bundle, then extract them all.
    ///
    /// Downloads start largest first. Extraction only begins once the whole
    /// batch has downloaded and verified, so a failed fetch means nothing from
    /// this run is extracted. If the run fails or is dropped early, every
    /// blob of this batch that was not fully extracted is removed from the
    /// cache, so the next run fetches and extracts it again.
    pub async fn apply(&self, state: Verified) -> Result<SyncReport> {
        let Verified {
            stream,
            purged,
            mut needed,
        } = state;
        needed.sort_by(|a, b| b.size.cmp(&a.size));
        let stream = Arc::new(stream);
        let mut pending = PendingBlobs::new(self.store(), &stream.name, &needed);

        let fetched: Vec<FetchReport> = self
            .options
            .fetch_pool
            .run(needed.iter().cloned(), |bundle| {
                let fetcher = Arc::clone(&self.fetcher);
                let stream = Arc::clone(&stream);
                async move {
                    fetcher
                        .fetch(&stream, &bundle)
                        .await
                        .map_err(|e| SyncError::from_fetch(&bundle.checksum, e))
                }
            })
            .await?;

        let extracted: Vec<ExtractReport> = self
            .options
            .fetch_pool
            .run(
                needed.into_iter().zip(fetched.iter().map(|r| r.path.clone())).enumerate(),
                |(index, (bundle, blob))| {
                    let extractor = Arc::clone(&self.extractor);
                    let stream = Arc::clone(&stream);
                    let applied = Arc::clone(&pending.applied);
                    async move {
                        tokio::task::spawn_blocking(move || -> Result<ExtractReport> {
                            let report = extractor
                                .extract(&stream.name, &bundle, &blob)
                                .map_err(|e| SyncError::from_extract(&bundle.checksum, e))?;
                            applied[index].store(true, Ordering::Release);
                            Ok(report)
                        })
                        .await?
                    }
                },
            )
            .await?;
        pending.disarm();

        let mut totals = ExtractReport::default();
        extracted.into_iter().for_each(|r| totals.merge(r));

        Ok(SyncReport {
            stream: stream.name.clone(),
            purged,
            fetched: fetched.len(),
            extracted_entries: totals.entries,
            bytes_downloaded: fetched.iter().map(|r| r.bytes).sum(),
        })
    }

    /// Run a selected stream to a terminal state.
    pub async fn run(&self, state: StreamSelected) -> Outcome {
        let name = state.stream.name.clone();
        let result = async {
            let loaded = self.load_manifest(state).await?;
            let verified = self.verify(loaded).await?;
            self.apply(verified).await
        }
        .await;

        match &result {
            Ok(report) => info!(
                stream = %name,
                purged = report.purged,
                fetched = report.fetched,
                entries = report.extracted_entries,
                bytes = report.bytes_downloaded,
                "stream synchronized"
            ),
            Err(SyncError::Interrupted) => warn!(stream = %name, "synchronization interrupted"),
            Err(err) => error!(stream = %name, %err, "synchronization failed"),
        }
        result.into()
    }

    /// Blocking entry point: run `stream` on a fresh multi-threaded runtime.
    ///
    /// Must not be called from within a Tokio runtime; use [`run`](Self::run)
    /// there. Doing so fails with [`SyncError::Worker`] instead of blocking
    /// the caller's executor.
    pub fn synchronize(&self, stream: Stream) -> Outcome {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Outcome::Failed(SyncError::Worker(
                "synchronize called from inside an async runtime".to_owned(),
            ));
        }
        let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
            Ok(runtime) => runtime,
            Err(e) => return Outcome::Failed(SyncError::Worker(format!("failed to start runtime: {e}"))),
        };
        runtime.block_on(self.run(StreamSelected::new(stream)))
    }
}

/// Blobs fetched by an `apply` that has not finished extracting them.
///
/// Unless disarmed, dropping this removes every blob whose extraction did not
/// complete. A blob left behind would verify on the next run and its files
/// would never be written.
struct PendingBlobs<'a> {
    store: &'a CacheStore,
    stream: &'a str,
    checksums: Vec<String>,
    applied: Arc<[AtomicBool]>,
    armed: bool,
}

impl<'a> PendingBlobs<'a> {
    fn new(store: &'a CacheStore, stream: &'a str, bundles: &[Bundle]) -> Self {
        Self {
            store,
            stream,
            checksums: bundles.iter().map(|b| b.checksum.clone()).collect(),
            applied: bundles.iter().map(|_| AtomicBool::new(false)).collect(),
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PendingBlobs<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        for (checksum, applied) in self.checksums.iter().zip(self.applied.iter()) {
            if applied.load(Ordering::Acquire) {
                continue;
            }
            match self.store.remove(self.stream, checksum) {
                Ok(true) => debug!(stream = self.stream, checksum, "discarded unextracted bundle"),
                Ok(false) => {}
                Err(err) => warn!(stream = self.stream, checksum, %err, "failed to discard unextracted bundle"),
            }
        }
    }
}
