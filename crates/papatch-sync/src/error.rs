use papatch_fetch::FetchError;
use papatch_manifest::ManifestError;
use papatch_store::StoreError;
use tokio::task::JoinError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a synchronization run ended in `Failed`.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("authentication failed: {0}")]
    AuthFailed(#[source] BoxError),

    #[error("stream list unavailable: {0}")]
    StreamListUnavailable(#[source] BoxError),

    #[error("unknown stream '{name}' (available: {})", .available.join(", "))]
    UnknownStream { name: String, available: Vec<String> },

    #[error("stream name '{name}' cannot be used as a directory name")]
    InvalidStreamName { name: String },

    #[error("manifest unavailable from {url}: {source}")]
    ManifestUnavailable {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("malformed manifest: {0}")]
    MalformedManifest(#[from] ManifestError),

    #[error("cache I/O failed: {0}")]
    CacheIo(#[from] StoreError),

    #[error("bundle {expected} failed verification after download (got {actual})")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("download of bundle {checksum} failed: {source}")]
    DownloadFailed {
        checksum: String,
        #[source]
        source: FetchError,
    },

    #[error("extraction of bundle {checksum} failed: {source}")]
    ExtractionFailed {
        checksum: String,
        #[source]
        source: papatch_archive::Error,
    },

    #[error("interrupted")]
    Interrupted,

    #[error("worker failed: {0}")]
    Worker(String),
}

impl SyncError {
    /// Classify a fetch failure for bundle `checksum`.
    pub fn from_fetch(checksum: &str, err: FetchError) -> Self {
        match err {
            FetchError::ChecksumMismatch { expected, actual } => Self::ChecksumMismatch { expected, actual },
            FetchError::Store(e) => Self::CacheIo(e),
            FetchError::Write { path, source } => Self::CacheIo(StoreError::Io { path, source }),
            other => Self::DownloadFailed {
                checksum: checksum.to_owned(),
                source: other,
            },
        }
    }

    pub fn from_extract(checksum: &str, source: papatch_archive::Error) -> Self {
        Self::ExtractionFailed {
            checksum: checksum.to_owned(),
            source,
        }
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted)
    }
}

impl From<JoinError> for SyncError {
    fn from(err: JoinError) -> Self {
        if err.is_cancelled() {
            Self::Interrupted
        } else {
            Self::Worker(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
