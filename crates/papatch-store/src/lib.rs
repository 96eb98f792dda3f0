//! On-disk, content-addressed cache of bundle blobs.
//!
//! Layout: `<cache-root>/<stream-name>/<sha1-hex-checksum>`, one flat file per
//! bundle with no index beyond the directory listing.

mod error;
mod store;

pub use error::{Result, StoreError};
pub use store::{CacheStore, PurgeMode};
