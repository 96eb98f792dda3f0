//! Stream catalogue entries and the bundle manifest of a stream.
//!
//! A manifest arrives as gzip-compressed JSON whose numeric fields are
//! decimal strings:
//!
//! ```json
//! {"bundles": [{"checksum": "…", "size": "123", "entries": [
//!     {"filename": "/bin/pa", "offset": "0", "size": "123", "sizeZ": "0", "executable": ""}
//! ]}]}
//! ```

mod decimal;
mod error;
mod model;
mod stream;

pub use error::{ManifestError, Result};
pub use model::{Bundle, Entry, Manifest};
pub use stream::Stream;
