//! Bundle downloading with streaming verification and staged placement.
//!
//! # Architecture
//!
//! - [`data`] - Options and progress types
//! - [`rate`] - Token-bucket throughput capping
//! - `effects` - The [`HttpClient`] seam, its reqwest implementation and the
//!   [`Fetcher`] itself
//!
//! A fetch never leaves a half-written blob under a cache key: bytes land in a
//! staged sibling, are hashed as they stream, and are renamed into place only
//! after the SHA-1 matches the bundle's checksum.

pub mod data;
mod effects;
mod error;
pub mod rate;

pub use data::{FetchOptions, FetchPhase, Progress, ProgressCallback, ProgressGate};
pub use effects::{Body, BoxStream, FetchReport, Fetcher, HttpClient};
pub use error::{BoxError, FetchError, Result};
pub use rate::{ThrottledStream, TokenBucket};

#[cfg(feature = "test-util")]
pub use effects::{MemoryClient, MemoryClientError};

#[cfg(feature = "reqwest")]
pub use effects::{ClientSetting, ClientSettingError, ReqwestClient};
