//! Atomic filesystem primitives.
//!
//! Nothing written through this crate is ever observable half-written: content
//! lands in a hidden sibling file first and is renamed over the destination
//! once complete.

mod error;
pub mod permissions;
pub mod primitives;
pub mod workflow;

pub use error::{Error, Result};
pub use permissions::{add_mode_bits, set_owner_executable};
pub use primitives::{
    AtomicWriteOptions, atomic_write, atomic_write_from, ensure_dir, is_plain_name,
    remove_if_exists, sibling_temp_path,
};
pub use workflow::StagedFile;
