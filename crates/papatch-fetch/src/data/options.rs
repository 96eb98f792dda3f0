use std::fmt;
use std::sync::Arc;

use super::progress::Progress;

pub type ProgressCallback = Arc<dyn Fn(&Progress) + Send + Sync>;

/// Phases of a bundle download.
///
/// Downloads progress through these phases in order:
/// Connecting → Downloading → Verifying → Committing → Completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPhase {
    /// Request sent, waiting for the response body.
    #[default]
    Connecting,

    /// Streaming the body into the staged cache file.
    Downloading,

    /// Body complete; comparing the digest against the bundle checksum.
    Verifying,

    /// Renaming the staged file onto its cache key.
    Committing,

    /// The blob is in the cache under its checksum.
    Completed,
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchPhase::Connecting => write!(f, "Connecting"),
            FetchPhase::Downloading => write!(f, "Downloading"),
            FetchPhase::Verifying => write!(f, "Verifying"),
            FetchPhase::Committing => write!(f, "Committing"),
            FetchPhase::Completed => write!(f, "Completed"),
        }
    }
}

/// Per-fetch behaviour that is not part of the transport.
///
/// Connect timeout and redirect limits live on the transport itself
/// (see `ClientSetting`); throughput capping happens here, on the body stream.
#[derive(Clone, Default)]
pub struct FetchOptions {
    /// Throughput cap in bytes per second for a single transfer. `None` is unlimited.
    pub rate_limit: Option<u64>,

    /// Progress observer.
    ///
    /// Invoked on every phase transition and, while downloading, at most once
    /// per percent of advancement.
    pub on_progress: Option<ProgressCallback>,
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("rate_limit", &self.rate_limit)
            .field("on_progress", &self.on_progress.as_ref().map(|_| "{ ... }"))
            .finish()
    }
}

impl FetchOptions {
    /// Cap the throughput of each transfer; `0` removes the cap.
    #[must_use]
    pub fn rate_limit(mut self, bytes_per_second: u64) -> Self {
        self.rate_limit = (bytes_per_second > 0).then_some(bytes_per_second);
        self
    }

    #[must_use]
    pub fn on_progress(mut self, callback: impl Fn(&Progress) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn progress_callback(mut self, callback: Option<ProgressCallback>) -> Self {
        self.on_progress = callback;
        self
    }
}
