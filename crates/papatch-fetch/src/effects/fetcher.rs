use std::path::PathBuf;

use futures_util::TryStreamExt;
use papatch_manifest::{Bundle, Stream};
use papatch_store::CacheStore;
use papatch_verify::{Hasher, Sha1Hasher};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::data::{FetchOptions, FetchPhase, Progress, ProgressGate};
use crate::effects::http::{BoxStream, HttpClient};
use crate::error::{FetchError, Result};
use crate::rate::ThrottledStream;

/// Outcome of a successful bundle fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReport {
    pub checksum: String,
    pub path: PathBuf,
    pub bytes: u64,
}

/// Downloads bundles into a [`CacheStore`], verifying them on the way in.
pub struct Fetcher<C: HttpClient> {
    client: C,
    store: CacheStore,
    options: FetchOptions,
}

impl<C: HttpClient> Fetcher<C> {
    pub fn new(client: C, store: CacheStore) -> Self {
        Self {
            client,
            store,
            options: FetchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Fetch `bundle` from `stream`'s content host into the cache.
    ///
    /// Any existing blob under the bundle's key is removed first. The body is
    /// hashed while it streams into a staged file, and the stage only replaces
    /// the cache key when the SHA-1 matches; on mismatch the staged bytes are
    /// deleted and [`FetchError::ChecksumMismatch`] is returned.
    pub async fn fetch(&self, stream: &Stream, bundle: &Bundle) -> Result<FetchReport> {
        let checksum = bundle.checksum.as_str();
        let url = stream.bundle_url(checksum);
        let mut progress = Progress {
            resource: checksum.to_owned(),
            phase: FetchPhase::Connecting,
            bytes_downloaded: 0,
            total_bytes: None,
        };
        self.report_progress(&progress);

        let staged = self.store.stage(&stream.name, checksum)?;
        let body = self
            .client
            .get(&url)
            .await
            .map_err(|e| FetchError::download(&url, e))?;

        progress.total_bytes = body
            .content_length
            .or_else(|| (bundle.size > 0).then_some(bundle.size));
        progress.phase = FetchPhase::Downloading;
        self.report_progress(&progress);

        let mut chunks: BoxStream<'static, _> = match self.options.rate_limit {
            Some(limit) => Box::pin(ThrottledStream::new(body.chunks, limit)),
            None => body.chunks,
        };

        let write_err = |source| FetchError::Write {
            path: staged.path().to_path_buf(),
            source,
        };
        let mut file = tokio::fs::File::create(staged.path()).await.map_err(write_err)?;
        let mut hasher = Sha1Hasher::new();
        let mut gate = ProgressGate::new(progress.total_bytes);

        while let Some(chunk) = chunks
            .try_next()
            .await
            .map_err(|e| FetchError::download(&url, e))?
        {
            hasher.update(&chunk);
            file.write_all(&chunk).await.map_err(write_err)?;
            progress.bytes_downloaded += chunk.len() as u64;

            if gate.should_emit(progress.bytes_downloaded) {
                self.report_progress(&progress);
            }
        }

        file.flush().await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;
        drop(file);

        progress.phase = FetchPhase::Verifying;
        self.report_progress(&progress);

        let actual = hasher.finalize_hex();
        if actual != checksum {
            warn!(stream = %stream.name, checksum, actual, "downloaded bundle failed verification");
            // dropping the stage deletes the bad bytes
            drop(staged);
            return Err(FetchError::ChecksumMismatch {
                expected: checksum.to_owned(),
                actual,
            });
        }

        progress.phase = FetchPhase::Committing;
        self.report_progress(&progress);
        let path = staged.commit().map_err(papatch_store::StoreError::from)?;

        progress.phase = FetchPhase::Completed;
        self.report_progress(&progress);
        debug!(stream = %stream.name, checksum, bytes = progress.bytes_downloaded, "bundle fetched");

        Ok(FetchReport {
            checksum: checksum.to_owned(),
            path,
            bytes: progress.bytes_downloaded,
        })
    }

    fn report_progress(&self, progress: &Progress) {
        if let Some(ref callback) = self.options.on_progress {
            callback(progress);
        }
    }
}
