use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// A file being produced next to its final destination.
///
/// Writers fill [`StagedFile::path`]; [`StagedFile::commit`] renames it over the
/// destination. Dropping an uncommitted stage removes the partial file, so an
/// aborted write never shows up under the destination name.
#[derive(Debug)]
pub struct StagedFile {
    staging_path: PathBuf,
    destination_path: PathBuf,
    committed: bool,
}

impl StagedFile {
    pub const SUFFIX: &'static str = "part";

    /// Prepare a stage for `destination`, creating its parent directory and
    /// clearing out any leftover stage from an earlier run.
    pub fn new(destination: impl AsRef<Path>) -> Result<Self> {
        let destination_path = destination.as_ref().to_path_buf();
        let parent = destination_path
            .parent()
            .ok_or_else(|| Error::NoParent(destination_path.clone()))?;
        crate::ensure_dir(parent)?;

        let name = destination_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let staging_path = parent.join(format!(".{name}.{}", Self::SUFFIX));
        crate::remove_if_exists(&staging_path)?;

        Ok(Self {
            staging_path,
            destination_path,
            committed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.staging_path
    }

    pub fn destination(&self) -> &Path {
        &self.destination_path
    }

    pub fn commit(mut self) -> Result<PathBuf> {
        std::fs::rename(&self.staging_path, &self.destination_path).map_err(|e| Error::Write {
            path: self.destination_path.clone(),
            source: e,
        })?;
        self.committed = true;
        Ok(self.destination_path.clone())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_file(&self.staging_path);
        }
    }
}
