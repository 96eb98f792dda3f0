use crate::{Error, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Clone, Copy, Debug, Default)]
pub struct AtomicWriteOptions {
    pub permissions: Option<u32>,
    pub sync: bool,
}

impl AtomicWriteOptions {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn permissions(mut self, mode: u32) -> Self {
        self.permissions = Some(mode);
        self
    }
    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }
}

/// A hidden, process-unique sibling of `path` used as a write target.
pub fn sibling_temp_path(path: &Path) -> Result<PathBuf> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::NoParent(path.to_path_buf()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    Ok(parent.join(format!(".{name}.{}.{n}.tmp", std::process::id())))
}

pub fn atomic_write(
    path: impl AsRef<Path>,
    content: &[u8],
    options: AtomicWriteOptions,
) -> Result<()> {
    atomic_write_from(path, &mut &content[..], options).map(|_| ())
}

/// Copy `reader` to `path` through a temporary sibling, then rename it into place.
///
/// The temporary file is created with the process's default mode, so the
/// result carries the same permissions a plain `File::create` would give it.
pub fn atomic_write_from(
    path: impl AsRef<Path>,
    reader: &mut impl Read,
    options: AtomicWriteOptions,
) -> Result<u64> {
    let path = path.as_ref();
    let tmp_path = sibling_temp_path(path)?;
    let write_err = |source: io::Error| Error::Write {
        path: tmp_path.clone(),
        source,
    };

    let mut file: File = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)
        .map_err(write_err)?;

    let written = match copy_and_finish(reader, &mut file, options) {
        Ok(n) => n,
        Err(e) => {
            drop(file);
            let _ = fs::remove_file(&tmp_path);
            return Err(write_err(e));
        }
    };
    drop(file);

    #[cfg(unix)]
    if let Some(mode) = options.permissions {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = fs::set_permissions(&tmp_path, fs::Permissions::from_mode(mode)) {
            let _ = fs::remove_file(&tmp_path);
            return Err(Error::Permissions {
                path: tmp_path,
                source: e,
            });
        }
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        Error::Write {
            path: path.to_path_buf(),
            source: e,
        }
    })?;

    Ok(written)
}

fn copy_and_finish(reader: &mut impl Read, file: &mut File, options: AtomicWriteOptions) -> io::Result<u64> {
    let n = io::copy(reader, file)?;
    file.flush()?;
    if options.sync {
        file.sync_all()?;
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.txt");
        atomic_write(&path, b"hello world", AtomicWriteOptions::new()).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"hello world");
    }

    #[test]
    fn test_atomic_write_replaces_existing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.txt");
        fs::write(&path, "original").unwrap();

        atomic_write(&path, b"new", AtomicWriteOptions::new()).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.txt");
        let written =
            atomic_write_from(&path, &mut &b"streamed"[..], AtomicWriteOptions::new().sync(true))
                .unwrap();

        assert_eq!(written, 8);
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("test.txt")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_atomic_write_with_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("test.txt");
        atomic_write(&path, b"data", AtomicWriteOptions::new().permissions(0o755)).unwrap();
        let metadata = fs::metadata(&path).unwrap();
        assert_eq!(metadata.permissions().mode() & 0o777, 0o755);
    }

    #[test]
    fn test_atomic_write_missing_parent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("test.txt");
        let err = atomic_write(&path, b"data", AtomicWriteOptions::new()).unwrap_err();
        assert!(err.is_not_found());
    }
}
