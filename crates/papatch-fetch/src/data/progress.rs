use crate::data::options::FetchPhase;

/// Snapshot handed to progress callbacks.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    /// Checksum of the bundle being fetched.
    pub resource: String,

    pub phase: FetchPhase,

    /// Bytes written to the staged file so far.
    pub bytes_downloaded: u64,

    /// Expected size, from Content-Length or the manifest's declared size.
    pub total_bytes: Option<u64>,
}

impl Progress {
    pub fn fraction(&self) -> Option<f64> {
        self.total_bytes
            .filter(|total| *total > 0)
            .map(|total| (self.bytes_downloaded as f64 / total as f64).min(1.0))
    }
}

/// Rate limiter for download notifications.
///
/// Lets the first observation through, then only those that advanced by at
/// least one percent, and always the one that reaches completion. Without a
/// known total nothing is emitted.
#[derive(Debug, Clone)]
pub struct ProgressGate {
    total: Option<u64>,
    last_fraction: Option<f64>,
}

impl ProgressGate {
    pub const STEP: f64 = 0.01;

    pub fn new(total: Option<u64>) -> Self {
        Self {
            total: total.filter(|t| *t > 0),
            last_fraction: None,
        }
    }

    pub fn should_emit(&mut self, bytes: u64) -> bool {
        let Some(total) = self.total else {
            return false;
        };
        let fraction = (bytes as f64 / total as f64).min(1.0);

        if let Some(last) = self.last_fraction {
            if last >= 1.0 {
                return false;
            }
            if fraction < 1.0 && fraction - last < Self::STEP {
                return false;
            }
        }
        self.last_fraction = Some(fraction);
        true
    }
}
