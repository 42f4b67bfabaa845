//! Resource path rules.
//!
//! A path starts with `/`, never ends with `/` (the root itself excepted) and
//! has no empty, `.` or `..` segments.

use crate::error::{StoreError, StoreResult};

/// The root path.
pub const ROOT: &str = "/";

/// Validate a path that may name a folder, including the root.
pub fn validate(path: &str) -> StoreResult<()> {
    if path == ROOT {
        return Ok(());
    }
    let Some(rest) = path.strip_prefix('/') else {
        return Err(StoreError::invalid_path(path, "must start with '/'"));
    };
    if rest.ends_with('/') {
        return Err(StoreError::invalid_path(path, "must not end with '/'"));
    }
    for segment in rest.split('/') {
        match segment {
            "" => return Err(StoreError::invalid_path(path, "empty segment")),
            "." | ".." => return Err(StoreError::invalid_path(path, "relative segment")),
            _ => {}
        }
    }
    Ok(())
}

/// Validate a path that names a resource. The root is never a resource.
pub fn validate_resource(path: &str) -> StoreResult<()> {
    if path == ROOT {
        return Err(StoreError::invalid_path(path, "root is not a resource"));
    }
    validate(path)
}

/// Join a folder path and a child name.
pub fn child(parent: &str, name: &str) -> String {
    if parent == ROOT {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Parent folder of a path, or `None` for the root.
pub fn parent(path: &str) -> Option<&str> {
    if path == ROOT {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some(ROOT),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}

/// Every proper ancestor of a path, nearest first, excluding the root.
pub fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    std::iter::successors(parent(path), |p| parent(*p)).take_while(|p| *p != ROOT)
}

/// Last segment of a path.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
