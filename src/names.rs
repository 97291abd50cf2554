//! Mapping between file-system paths and archive entry names.
//!
//! Entry names are relative to the archived folder, use `/` as the only
//! separator, and never start with one. A trailing `/` marks an empty
//! directory so the container can tell it apart from a zero-byte file.

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Separator used inside entry names.
pub const SEPARATOR: char = '/';

/// Build the entry name for `path`, a descendant of `root`.
///
/// Both paths are expected to be absolute. When `directory` is set the name
/// gets a trailing separator.
///
/// # Errors
///
/// Returns [`Error::InvalidPath`] if `path` is not below `root`.
pub fn entry_name(root: &Path, path: &Path, directory: bool) -> Result<String> {
    let invalid = || Error::InvalidPath {
        root: root.to_path_buf(),
        path: path.to_path_buf(),
    };

    let relative = path.strip_prefix(root).map_err(|_| invalid())?;

    let mut name = String::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                if !name.is_empty() {
                    name.push(SEPARATOR);
                }
                name.push_str(&part.to_string_lossy());
            }
            Component::CurDir => {}
            _ => return Err(invalid()),
        }
    }

    if name.is_empty() {
        return Err(invalid());
    }
    if directory {
        name.push(SEPARATOR);
    }
    Ok(name)
}

/// Whether an entry name denotes a directory marker.
///
/// Archives written on Windows by other tools sometimes use `\`.
pub fn is_directory_name(name: &str) -> bool {
    name.ends_with(SEPARATOR) || name.ends_with('\\')
}

/// Resolve an entry name to a path below `dest`.
///
/// # Errors
///
/// Returns [`Error::InvalidPath`] for names that are empty, absolute, or
/// climb out of `dest` with `..`.
pub fn destination_path(dest: &Path, name: &str) -> Result<PathBuf> {
    let invalid = || Error::InvalidPath {
        root: dest.to_path_buf(),
        path: PathBuf::from(name),
    };

    let mut resolved = dest.to_path_buf();
    let mut depth = 0usize;
    for part in name.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => return Err(invalid()),
            part => {
                // Drive prefixes such as `C:` would replace `dest` on join.
                if Path::new(part).components().count() != 1
                    || !matches!(Path::new(part).components().next(), Some(Component::Normal(_)))
                {
                    return Err(invalid());
                }
                resolved.push(part);
                depth += 1;
            }
        }
    }

    if depth == 0 || name.starts_with(['/', '\\']) {
        return Err(invalid());
    }
    Ok(resolved)
}
