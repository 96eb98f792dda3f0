pub mod atomic_write;
pub mod name;
pub mod remove;

pub use atomic_write::{
    AtomicWriteOptions, atomic_write, atomic_write_from, sibling_temp_path,
};
pub use name::is_plain_name;
pub use remove::{ensure_dir, remove_if_exists};
