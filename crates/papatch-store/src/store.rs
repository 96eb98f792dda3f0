use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use papatch_fs::{AtomicWriteOptions, StagedFile};
use tracing::{debug, warn};

use crate::error::{Result, StoreError};

/// How [`CacheStore::purge`] chooses its victims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeMode<'a> {
    /// Remove every blob whose name is not in the set.
    Stale(&'a HashSet<String>),
    /// Remove everything, forcing a complete refetch.
    Full,
}

/// Directory tree of bundle blobs keyed `<root>/<stream>/<checksum>`.
///
/// A blob present under its key is assumed valid until hashing says otherwise.
/// Every operation stays inside the named stream's subdirectory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn stream_dir(&self, stream: &str) -> PathBuf {
        self.root.join(stream)
    }

    pub fn blob_path(&self, stream: &str, checksum: &str) -> PathBuf {
        self.stream_dir(stream).join(checksum)
    }

    /// The stream's directory, refusing names that would resolve outside
    /// the cache root.
    fn checked_dir(&self, stream: &str) -> Result<PathBuf> {
        if papatch_fs::is_plain_name(stream) {
            Ok(self.stream_dir(stream))
        } else {
            Err(StoreError::InvalidStream(stream.to_owned()))
        }
    }

    fn checked_blob(&self, stream: &str, checksum: &str) -> Result<PathBuf> {
        Ok(self.checked_dir(stream)?.join(checksum))
    }

    pub fn exists(&self, stream: &str, checksum: &str) -> bool {
        papatch_fs::is_plain_name(stream) && self.blob_path(stream, checksum).is_file()
    }

    /// Hash the stored blob and compare it with its key.
    ///
    /// Absent or mismatched blobs yield `Ok(false)` and are left in place;
    /// only I/O failures other than absence are errors.
    pub fn verify(&self, stream: &str, checksum: &str) -> Result<bool> {
        let path = self.checked_blob(stream, checksum)?;
        match papatch_verify::digest_file(&path) {
            Ok(actual) if actual.eq_ignore_ascii_case(checksum) => Ok(true),
            Ok(actual) => {
                warn!(stream, checksum, actual, "cached bundle is corrupt");
                Ok(false)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    /// Delete cached blobs under `stream`, returning how many were removed.
    pub fn purge(&self, stream: &str, mode: PurgeMode<'_>) -> Result<usize> {
        let dir = self.checked_dir(stream)?;
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(StoreError::io(dir, e)),
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&dir, e))?;
            let file_type = entry.file_type().map_err(|e| StoreError::io(entry.path(), e))?;
            if file_type.is_dir() {
                continue;
            }

            let name = entry.file_name();
            let keep = match mode {
                PurgeMode::Full => false,
                PurgeMode::Stale(keep) => name.to_str().is_some_and(|n| keep.contains(n)),
            };
            if !keep && papatch_fs::remove_if_exists(entry.path())? {
                debug!(stream, blob = %name.to_string_lossy(), "purged cached bundle");
                removed += 1;
            }
        }
        Ok(removed)
    }

    pub fn purge_stale(&self, stream: &str, keep: &HashSet<String>) -> Result<usize> {
        self.purge(stream, PurgeMode::Stale(keep))
    }

    pub fn purge_all(&self, stream: &str) -> Result<usize> {
        self.purge(stream, PurgeMode::Full)
    }

    /// Atomically replace the blob stored under `checksum`.
    pub fn write(&self, stream: &str, checksum: &str, bytes: &[u8]) -> Result<()> {
        let dir = self.checked_dir(stream)?;
        papatch_fs::ensure_dir(&dir)?;
        papatch_fs::atomic_write(dir.join(checksum), bytes, AtomicWriteOptions::new())?;
        Ok(())
    }

    /// Remove any existing blob under `checksum` and open a stage for its
    /// replacement. The blob only reappears once the stage is committed.
    pub fn stage(&self, stream: &str, checksum: &str) -> Result<StagedFile> {
        let path = self.checked_blob(stream, checksum)?;
        papatch_fs::remove_if_exists(&path)?;
        Ok(StagedFile::new(path)?)
    }

    pub fn remove(&self, stream: &str, checksum: &str) -> Result<bool> {
        Ok(papatch_fs::remove_if_exists(self.checked_blob(stream, checksum)?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use papatch_verify::Sha1Hasher;
    use tempfile::tempdir;

    #[test]
    fn test_write_then_verify() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let data = b"bundle bytes";
        let sum = Sha1Hasher::digest_hex(data);

        store.write("stable", &sum, data).unwrap();

        assert!(store.exists("stable", &sum));
        assert!(store.verify("stable", &sum).unwrap());
        assert!(!store.exists("other", &sum));
    }

    #[test]
    fn test_verify_absent_is_false() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        assert!(!store.verify("stable", &Sha1Hasher::digest_hex(b"x")).unwrap());
    }

    #[test]
    fn test_verify_mismatch_keeps_file() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let sum = Sha1Hasher::digest_hex(b"expected");
        store.write("stable", &sum, b"something else").unwrap();

        assert!(!store.verify("stable", &sum).unwrap());
        assert!(store.exists("stable", &sum));
    }

    #[test]
    fn test_stream_name_cannot_leave_the_cache_root() {
        let outer = tempdir().unwrap();
        let root = outer.path().join("cache");
        std::fs::create_dir(&root).unwrap();
        let bystander = outer.path().join("keep.me");
        std::fs::write(&bystander, b"not a blob").unwrap();
        let store = CacheStore::new(&root);
        let sum = Sha1Hasher::digest_hex(b"v");

        for stream in ["..", "../cache", "/tmp", "a/b", ""] {
            assert!(matches!(store.purge_all(stream), Err(StoreError::InvalidStream(_))), "{stream}");
            assert!(matches!(store.write(stream, &sum, b"v"), Err(StoreError::InvalidStream(_))), "{stream}");
            assert!(matches!(store.verify(stream, &sum), Err(StoreError::InvalidStream(_))), "{stream}");
            assert!(matches!(store.stage(stream, &sum), Err(StoreError::InvalidStream(_))), "{stream}");
            assert!(matches!(store.remove(stream, "keep.me"), Err(StoreError::InvalidStream(_))), "{stream}");
            assert!(!store.exists(stream, "keep.me"));
        }
        assert!(bystander.exists());
    }

    #[test]
    fn test_purge_missing_stream_dir() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        assert_eq!(store.purge_all("nothing").unwrap(), 0);
    }

    #[test]
    fn test_stage_removes_existing_blob() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let sum = Sha1Hasher::digest_hex(b"v");
        store.write("stable", &sum, b"v").unwrap();

        let staged = store.stage("stable", &sum).unwrap();

        assert!(!store.exists("stable", &sum));
        std::fs::write(staged.path(), b"v").unwrap();
        staged.commit().unwrap();
        assert!(store.verify("stable", &sum).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_verify_unreadable_blob_is_an_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let sum = Sha1Hasher::digest_hex(b"locked");
        store.write("stable", &sum, b"locked").unwrap();
        let path = store.blob_path("stable", &sum);
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o000)).unwrap();

        // root ignores mode bits; nothing to assert in that case
        if std::fs::File::open(&path).is_ok() {
            return;
        }
        assert!(matches!(store.verify("stable", &sum), Err(StoreError::Io { .. })));
    }
}
