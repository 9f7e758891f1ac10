//! Snapshot path rules.
//!
//! Paths are relative and `/`-separated. Every component must be non-empty
//! and must not be `.` or `..`, so a path always names exactly one location
//! in a nested tree.

use crate::error::{IndexError, IndexResult};

/// Validate a file path for staging.
pub fn validate_path(path: &str) -> IndexResult<()> {
    let reject = |reason: &str| {
        Err(IndexError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        })
    };

    if path.is_empty() {
        return reject("empty path");
    }
    if path.starts_with('/') || path.ends_with('/') {
        return reject("leading or trailing '/'");
    }
    if path.contains('\0') {
        return reject("contains NUL");
    }
    for component in path.split('/') {
        match component {
            "" => return reject("empty component"),
            "." | ".." => return reject("relative component"),
            _ => {}
        }
    }
    Ok(())
}

/// Strict ancestors of `path`, shortest first: `a/b/c` yields `a`, `a/b`.
pub fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    path.match_indices('/').map(move |(i, _)| &path[..i])
}

/// Join a directory prefix and a name; an empty prefix is the root.
pub fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}
