use crate::{Error, Result};
use std::path::Path;

/// Owner-execute bit (`S_IXUSR`).
pub const OWNER_EXECUTE: u32 = 0o100;

/// OR `bits` into the file's current mode, keeping everything else.
#[cfg(unix)]
pub fn add_mode_bits(path: impl AsRef<Path>, bits: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let path = path.as_ref();
    let perm_err = |source| Error::Permissions {
        path: path.to_path_buf(),
        source,
    };
    let mut perms = std::fs::metadata(path).map_err(perm_err)?.permissions();
    perms.set_mode(perms.mode() | bits);
    std::fs::set_permissions(path, perms).map_err(perm_err)
}

#[cfg(not(unix))]
pub fn add_mode_bits(_path: impl AsRef<Path>, _bits: u32) -> Result<()> { Ok(()) }

pub fn set_owner_executable(path: impl AsRef<Path>) -> Result<()> {
    add_mode_bits(path, OWNER_EXECUTE)
}
