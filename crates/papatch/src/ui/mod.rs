pub mod tracker;

pub use tracker::SyncTracker;
