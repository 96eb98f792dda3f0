use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::{Hasher, Result, Sha1Hasher, VerificationError};

const BUFFER_SIZE: usize = 64 * 1024;

/// Streaming reader that hashes data as it passes through.
pub struct VerifiedReader<R, H> {
    reader: R,
    hasher: H,
}

impl<R, H> VerifiedReader<R, H> {
    pub fn new(reader: R, hasher: H) -> Self {
        Self { reader, hasher }
    }
}

impl<R: Read, H: Hasher> Read for VerifiedReader<R, H> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.read(buf)?;
        if n > 0 {
            self.hasher.update(&buf[..n]);
        }
        Ok(n)
    }
}

impl<R: Read, H: Hasher> VerifiedReader<R, H> {
    /// Drain whatever is left of the reader into the hasher.
    pub fn exhaust(&mut self) -> io::Result<u64> {
        io::copy(self, &mut io::sink())
    }

    /// Finalize verification against an expected lowercase hex digest.
    pub fn finish(self, expected: &str) -> Result<()> {
        let actual = self.hasher.finalize_hex();
        if actual.eq_ignore_ascii_case(expected) {
            Ok(())
        } else {
            Err(VerificationError::Mismatch {
                expected: expected.to_owned(),
                actual,
            })
        }
    }

    pub fn into_digest_hex(self) -> String {
        self.hasher.finalize_hex()
    }
}

/// Hex SHA-1 of everything `reader` yields.
pub fn digest_reader(reader: impl Read) -> io::Result<String> {
    let mut verified = VerifiedReader::new(reader, Sha1Hasher::new());
    verified.exhaust()?;
    Ok(verified.into_digest_hex())
}

/// Hex SHA-1 of a file's content, read in fixed-size chunks.
pub fn digest_file(path: impl AsRef<Path>) -> io::Result<String> {
    let file = File::open(path)?;
    digest_reader(BufReader::with_capacity(BUFFER_SIZE, file))
}
