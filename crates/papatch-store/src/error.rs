use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cache I/O failed at '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("stream name '{0}' is not a single path component")]
    InvalidStream(String),

    #[error(transparent)]
    Fs(#[from] papatch_fs::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
