use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use papatch_fs::AtomicWriteOptions;
use papatch_manifest::{Bundle, Entry};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::options::{ExtractOptions, ExtractProgress};
use crate::sanitize::sanitize_entry_path;

/// Totals for one extracted bundle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractReport {
    pub entries: usize,
    /// Bytes written to the installation tree, after decompression.
    pub bytes: u64,
}

impl ExtractReport {
    pub fn merge(&mut self, other: ExtractReport) {
        self.entries += other.entries;
        self.bytes += other.bytes;
    }
}

/// Unpacks bundle blobs into `<install_root>/<stream>/...`.
#[derive(Debug, Clone)]
pub struct Extractor {
    install_root: PathBuf,
    options: ExtractOptions,
}

impl Extractor {
    pub fn new(install_root: impl Into<PathBuf>) -> Self {
        Self {
            install_root: install_root.into(),
            options: ExtractOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    pub fn stream_root(&self, stream: &str) -> PathBuf {
        self.install_root.join(stream)
    }

    /// Write every entry of `bundle`, read from the blob at `blob`, into the
    /// stream's installation subtree.
    ///
    /// Entries are visited in offset order. Existing files are removed before
    /// their replacement is written, and each replacement goes through an
    /// atomic rename so no destination is ever left half-written.
    pub fn extract(&self, stream: &str, bundle: &Bundle, blob: &Path) -> Result<ExtractReport> {
        if !papatch_fs::is_plain_name(stream) {
            return Err(Error::InvalidStream {
                stream: stream.to_owned(),
            });
        }
        let base = self.stream_root(stream);
        let file = File::open(blob).map_err(|source| Error::OpenBlob {
            path: blob.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::new(file);

        let entries = bundle.entries_by_offset();
        let mut report = ExtractReport::default();

        for (index, entry) in entries.iter().enumerate() {
            let target = sanitize_entry_path(&entry.filename, &base)?;
            let content = read_entry(&mut reader, entry)?;
            self.write_entry(&target, entry, &content)?;

            report.entries += 1;
            report.bytes += content.len() as u64;
            trace!(path = %target.display(), bytes = content.len(), "entry extracted");

            if let Some(ref callback) = self.options.on_progress {
                callback(&ExtractProgress {
                    bundle: bundle.checksum.clone(),
                    entries_done: index + 1,
                    entries_total: entries.len(),
                    current_file: target,
                });
            }
        }

        debug!(stream, checksum = %bundle.checksum, entries = report.entries, bytes = report.bytes, "bundle extracted");
        Ok(report)
    }

    fn write_entry(&self, target: &Path, entry: &Entry, content: &[u8]) -> Result<()> {
        if let Some(parent) = target.parent() {
            papatch_fs::ensure_dir(parent)?;
        }
        papatch_fs::remove_if_exists(target)?;
        papatch_fs::atomic_write(target, content, AtomicWriteOptions::new().sync(self.options.sync))?;

        if entry.executable {
            papatch_fs::set_owner_executable(target)?;
        }
        Ok(())
    }
}

/// Read one entry's stored bytes and undo its nested compression, if any.
fn read_entry<R: Read + Seek>(reader: &mut R, entry: &Entry) -> Result<Vec<u8>> {
    let read_err = |source| Error::Read {
        entry: entry.filename.clone(),
        source,
    };
    let wanted = entry.stored_len();

    reader.seek(SeekFrom::Start(entry.offset)).map_err(read_err)?;
    // Sizes come from the manifest; let the blob bound the allocation.
    let mut stored = Vec::new();
    let got = reader.by_ref().take(wanted).read_to_end(&mut stored).map_err(read_err)?;
    if (got as u64) < wanted {
        return Err(Error::ShortRead {
            entry: entry.filename.clone(),
            offset: entry.offset,
            wanted,
        });
    }

    if !entry.is_compressed() {
        return Ok(stored);
    }

    let mut content = Vec::new();
    MultiGzDecoder::new(stored.as_slice())
        .read_to_end(&mut content)
        .map_err(|source: io::Error| Error::Decompress {
            entry: entry.filename.clone(),
            source,
        })?;
    Ok(content)
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use flate2::Compression;
    use flate2::write::GzEncoder;

    use super::*;

    fn entry(filename: &str, offset: u64, size: u64, size_z: u64) -> Entry {
        Entry {
            filename: filename.into(),
            offset,
            size,
            size_z,
            executable: false,
        }
    }

    #[test]
    fn reads_raw_slice() {
        let mut blob = Cursor::new(b"0123456789abcdef".to_vec());
        let content = read_entry(&mut blob, &entry("/a", 4, 6, 0)).unwrap();
        assert_eq!(content, b"456789");
    }

    #[test]
    fn inflates_nested_gzip() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&[b'x'; 40]).unwrap();
        let packed = encoder.finish().unwrap();

        let mut blob = b"pad".to_vec();
        blob.extend_from_slice(&packed);
        let mut blob = Cursor::new(blob);
        let content = read_entry(&mut blob, &entry("/x", 3, 40, packed.len() as u64)).unwrap();

        assert_eq!(content, vec![b'x'; 40]);
    }

    #[test]
    fn truncated_blob_is_short_read() {
        let mut blob = Cursor::new(b"short".to_vec());
        let result = read_entry(&mut blob, &entry("/a", 2, 10, 0));
        assert!(matches!(result, Err(Error::ShortRead { wanted: 10, .. })));
    }

    #[test]
    fn oversized_declared_length_is_short_read() {
        let mut blob = Cursor::new(b"tiny blob".to_vec());
        let result = read_entry(&mut blob, &entry("/a", 0, u64::MAX / 2, u64::MAX / 2));
        assert!(matches!(result, Err(Error::ShortRead { wanted, .. }) if wanted == u64::MAX / 2));
    }

    #[test]
    fn oversized_decompressed_length_is_not_trusted() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"small").unwrap();
        let packed = encoder.finish().unwrap();

        let mut blob = Cursor::new(packed.clone());
        let content = read_entry(&mut blob, &entry("/a", 0, u64::MAX / 2, packed.len() as u64)).unwrap();
        assert_eq!(content, b"small");
    }

    #[test]
    fn garbage_compressed_entry_fails() {
        let mut blob = Cursor::new(b"definitely not gzip".to_vec());
        let result = read_entry(&mut blob, &entry("/a", 0, 40, 19));
        assert!(matches!(result, Err(Error::Decompress { .. })));
    }
}
