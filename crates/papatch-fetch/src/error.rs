//! Error types for papatch-fetch.

use std::io;
use std::path::PathBuf;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("download of {url} failed: {source}")]
    DownloadFailed {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Store(#[from] papatch_store::StoreError),
}

impl FetchError {
    pub(crate) fn download(url: &str, source: impl Into<BoxError>) -> Self {
        Self::DownloadFailed {
            url: url.to_owned(),
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
