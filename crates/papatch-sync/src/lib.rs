//! Synchronizes a local installation with a stream's manifest.
//!
//! A run selects a stream, downloads its manifest, purges and hashes the
//! local bundle cache, downloads what is missing or corrupt, and unpacks the
//! fresh bundles into `<install-root>/<stream>/`. See [`Orchestrator`].
//!
//! ```no_run
//! use papatch_fetch::MemoryClient;
//! use papatch_manifest::Stream;
//! use papatch_sync::{Orchestrator, SyncOptions};
//!
//! let stream = Stream {
//!     name: "stable".into(),
//!     download_url: "https://cdn.example.com".into(),
//!     title_folder: "PA".into(),
//!     manifest_name: "manifest.json.gz".into(),
//!     auth_suffix: String::new(),
//! };
//! let orchestrator = Orchestrator::new(MemoryClient::new(), "/tmp/cache", "/tmp/game", SyncOptions::default());
//! let outcome = orchestrator.synchronize(stream);
//! println!("synced: {}", outcome.is_synced());
//! ```

mod error;
mod orchestrator;
mod pool;
mod session;
mod verify;

pub use error::{BoxError, Result, SyncError};
pub use orchestrator::{ManifestLoaded, Orchestrator, Outcome, StreamSelected, SyncOptions, SyncReport, Verified};
pub use pool::{WorkerPool, available_parallelism};
pub use session::{Session, SessionProvider, StreamCatalog, open_catalog};
pub use verify::{Verifier, VerifyReport};
