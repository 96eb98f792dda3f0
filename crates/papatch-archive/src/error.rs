use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("entry '{entry}' escapes the installation tree")]
    PathEscape { entry: String },

    #[error("stream name '{stream}' is not a single path component")]
    InvalidStream { stream: String },

    #[error("entry '{entry}' has an empty path")]
    EmptyPath { entry: String },

    #[error("failed to open bundle blob '{path}': {source}")]
    OpenBlob {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("bundle blob ended before entry '{entry}' ({wanted} bytes at offset {offset})")]
    ShortRead {
        entry: String,
        offset: u64,
        wanted: u64,
    },

    #[error("failed to read entry '{entry}': {source}")]
    Read {
        entry: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to decompress entry '{entry}': {source}")]
    Decompress {
        entry: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Fs(#[from] papatch_fs::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
