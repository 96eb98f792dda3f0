//! Content verification primitives for cached bundles.
//!
//! Bundles are addressed by the lowercase hex SHA-1 of their bytes. This crate
//! provides incremental hashing so a blob can be checked while it streams past,
//! plus whole-file helpers for verifying what already sits on disk.
//!
//! # Example
//!
//! ```
//! use std::io::Read;
//! use papatch_verify::{Sha1Hasher, VerifiedReader};
//!
//! let data = b"hello world";
//! let expected = Sha1Hasher::digest_hex(data);
//!
//! let mut reader = VerifiedReader::new(&data[..], Sha1Hasher::new());
//! let mut buffer = Vec::new();
//! reader.read_to_end(&mut buffer).unwrap();
//!
//! reader.finish(&expected).unwrap();
//! ```

pub use self::error::{Result, VerificationError};
pub use self::hasher::{Hasher, Sha1Hasher};
pub use self::reader::{VerifiedReader, digest_file, digest_reader};

mod error;
mod hasher;
mod reader;
