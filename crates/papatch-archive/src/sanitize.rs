use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Resolve a manifest entry filename under `base`.
///
/// Manifest filenames are rooted (`/bin/pa`), so leading separators are
/// stripped first. Whatever remains must be a plain relative path: parent,
/// root and prefix components are refused rather than normalized away.
pub fn sanitize_entry_path(filename: &str, base: &Path) -> Result<PathBuf> {
    let relative = Path::new(filename.trim_start_matches(['/', '\\']));
    let mut resolved = base.to_path_buf();
    let mut depth = 0usize;

    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                resolved.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(Error::PathEscape {
                    entry: filename.to_owned(),
                });
            }
        }
    }

    if depth == 0 {
        return Err(Error::EmptyPath {
            entry: filename.to_owned(),
        });
    }
    Ok(resolved)
}
