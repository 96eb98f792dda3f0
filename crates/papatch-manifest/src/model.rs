use std::collections::HashSet;
use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};

use crate::decimal;
use crate::error::{ManifestError, Result};

/// The desired installation state of a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub bundles: Vec<Bundle>,
}

/// A content-addressed blob holding one or more entries at byte offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    /// Lowercase hex SHA-1 of the blob; also its cache and remote object name.
    pub checksum: String,
    #[serde(with = "decimal")]
    pub size: u64,
    pub entries: Vec<Entry>,
}

/// One file produced from a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub filename: String,
    #[serde(with = "decimal")]
    pub offset: u64,
    #[serde(with = "decimal")]
    pub size: u64,
    /// Length of the nested compressed payload; `0` means stored raw.
    #[serde(rename = "sizeZ", with = "decimal")]
    pub size_z: u64,
    #[serde(
        default,
        deserialize_with = "decimal::present",
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub executable: bool,
}

impl Entry {
    pub fn is_compressed(&self) -> bool {
        self.size_z != 0
    }

    /// Number of bytes this entry occupies inside the bundle blob.
    pub fn stored_len(&self) -> u64 {
        if self.is_compressed() { self.size_z } else { self.size }
    }
}

impl Bundle {
    /// Entries ordered by their offset into the blob.
    pub fn entries_by_offset(&self) -> Vec<&Entry> {
        let mut entries: Vec<&Entry> = self.entries.iter().collect();
        entries.sort_by_key(|e| e.offset);
        entries
    }
}

impl Manifest {
    /// Decode a gzip-compressed UTF-8 JSON manifest.
    pub fn from_gzip_json(raw: &[u8]) -> Result<Self> {
        let mut json = Vec::new();
        MultiGzDecoder::new(raw)
            .read_to_end(&mut json)
            .map_err(ManifestError::Decompress)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &[u8]) -> Result<Self> {
        let mut manifest: Manifest = serde_json::from_slice(json)?;
        for bundle in &mut manifest.bundles {
            bundle.checksum = normalize_checksum(&bundle.checksum)?;
        }
        Ok(manifest)
    }

    pub fn to_gzip_json(&self) -> Result<Vec<u8>> {
        let json = serde_json::to_vec(self)?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json).map_err(ManifestError::Encode)?;
        encoder.finish().map_err(ManifestError::Encode)
    }

    pub fn checksums(&self) -> HashSet<String> {
        self.bundles.iter().map(|b| b.checksum.clone()).collect()
    }

    pub fn total_size(&self) -> u64 {
        self.bundles.iter().map(|b| b.size).sum()
    }
}

/// Checksums double as file names, so anything but 40 hex digits is refused.
fn normalize_checksum(checksum: &str) -> Result<String> {
    if checksum.len() == 40 && checksum.bytes().all(|b| b.is_ascii_hexdigit()) {
        Ok(checksum.to_ascii_lowercase())
    } else {
        Err(ManifestError::InvalidChecksum(checksum.to_owned()))
    }
}
