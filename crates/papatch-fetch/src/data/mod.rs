//! Immutable configuration and progress types for fetching.

pub mod options;
pub mod progress;

pub use options::{FetchOptions, FetchPhase, ProgressCallback};
pub use progress::{Progress, ProgressGate};
