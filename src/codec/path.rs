//! Relative path addressing shared by every codec component
//!
//! Paths travel as `/`-separated strings relative to the traversal root,
//! whatever the platform separator is.

use std::path::{Component, Path, PathBuf};

/// Separator used in both text formats
pub const SEPARATOR: char = '/';

/// Render a relative path with `/` separators
pub fn to_relative_string(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether `name` can stand as one path segment under a directory
pub fn is_valid_segment(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(SEPARATOR)
        && !name.contains('\\')
        && !name.contains('\0')
}

/// Resolve a `/`-separated relative path under `root`
///
/// Returns `None` for empty, absolute or escaping paths.
pub fn resolve_relative(root: &Path, relative: &str) -> Option<PathBuf> {
    if relative.is_empty() || relative.starts_with(SEPARATOR) {
        return None;
    }

    let mut resolved = root.to_path_buf();
    for segment in relative.split(SEPARATOR) {
        if !is_valid_segment(segment) {
            return None;
        }
        resolved.push(segment);
    }
    Some(resolved)
}
