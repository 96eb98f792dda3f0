use std::io;

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("manifest is not valid gzip: {0}")]
    Decompress(#[source] io::Error),

    #[error("manifest JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bundle checksum '{0}' is not a 40 character hex SHA-1")]
    InvalidChecksum(String),

    #[error("failed to encode manifest: {0}")]
    Encode(#[source] io::Error),
}

pub type Result<T> = std::result::Result<T, ManifestError>;
