//! Bundle extraction into an installation tree.
//!
//! A bundle blob is a flat byte range. Each manifest entry names a slice of
//! it by offset; the slice is either the file content itself or a gzip
//! member that inflates to it.
//!
//! # Architecture
//!
//! - `sanitize.rs` - Entry path resolution (no escapes from the stream root)
//! - `extract.rs` - Offset-ordered reads, nested decompression, placement
//! - `options.rs` - Extraction options and progress callbacks

mod error;
mod extract;
mod options;
mod sanitize;

pub use error::{Error, Result};
pub use extract::{ExtractReport, Extractor};
pub use options::{ExtractCallback, ExtractOptions, ExtractProgress};
pub use sanitize::sanitize_entry_path;
