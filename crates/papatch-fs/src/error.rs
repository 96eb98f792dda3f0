use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to write '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to remove '{path}': {source}")]
    Remove { path: PathBuf, source: io::Error },

    #[error("failed to create directory '{path}': {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to set permissions on '{path}': {source}")]
    Permissions { path: PathBuf, source: io::Error },

    #[error("path has no parent directory: '{0}'")]
    NoParent(PathBuf),
}

impl Error {
    /// The underlying I/O error, when there is one.
    pub fn io(&self) -> Option<&io::Error> {
        match self {
            Error::Write { source, .. }
            | Error::Remove { source, .. }
            | Error::CreateDir { source, .. }
            | Error::Permissions { source, .. } => Some(source),
            Error::NoParent(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.io().is_some_and(|e| e.kind() == io::ErrorKind::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
