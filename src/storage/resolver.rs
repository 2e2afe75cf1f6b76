//! Symbolic link resolution for the default identity location.

use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::warn;

/// What a default identity location currently refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// Nothing exists at the location (or its metadata is unreadable).
    Absent,

    /// The link target, or the location itself when it is a regular file.
    Target(PathBuf),

    /// The entry is a symbolic link whose target could not be read.
    Unknown,
}

impl Resolved {
    /// The resolved path, if there is one.
    pub fn target(&self) -> Option<&Path> {
        match self {
            Resolved::Target(path) => Some(path),
            Resolved::Absent | Resolved::Unknown => None,
        }
    }
}

/// Resolve `path` to the file it refers to.
///
/// Relative link targets are joined onto the link's parent directory and
/// normalized so the result compares equal to absolute paths found in the
/// key store.
pub fn resolve_link(path: &Path) -> Resolved {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(_) => return Resolved::Absent,
    };

    if !metadata.file_type().is_symlink() {
        return Resolved::Target(path.to_path_buf());
    }

    match fs::read_link(path) {
        Ok(target) if target.is_relative() => {
            let base = path.parent().unwrap_or_else(|| Path::new(""));
            Resolved::Target(normalize(&base.join(target)))
        }
        Ok(target) => Resolved::Target(target),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unable to read symlink target");
            Resolved::Unknown
        }
    }
}

/// Lexically remove `.` and `..` components without touching the filesystem.
///
/// `..` at the root stays at the root.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last = normalized.components().next_back();
                let ends_in_name = matches!(last, Some(Component::Normal(_)));
                let at_root = matches!(last, Some(Component::RootDir));
                if ends_in_name {
                    normalized.pop();
                } else if !at_root {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
