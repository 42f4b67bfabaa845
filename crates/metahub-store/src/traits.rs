use bytes::Bytes;
use metahub_types::Version;

use crate::error::StoreResult;

/// A stored resource: opaque content plus its last-modified version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resource {
    pub content: Bytes,
    pub version: Version,
}

impl Resource {
    pub fn new(content: impl Into<Bytes>, version: Version) -> Self {
        Self {
            content: content.into(),
            version,
        }
    }
}

/// Durable key-path blob storage with per-path optimistic concurrency.
///
/// All implementations must satisfy these invariants:
/// - A path denotes exactly one resource or is absent. Directory-like paths
///   (paths that only have children) are never resources.
/// - `check_and_put` serializes its read-compare-write sequence per path, so
///   two callers with the same expected version never both succeed.
/// - A missing resource is reported as `Ok(None)` / `Ok(false)` / version `0`,
///   never as an error. I/O failures are propagated, never retried.
/// - Every write replaces prior content and version; no history is kept.
pub trait ResourceStore: Send + Sync {
    /// List the children of a directory-like path as full paths.
    ///
    /// Returns `Ok(None)` if `path` is not directory-like (a leaf resource or
    /// nothing at all). That is a valid negative answer, not a failure.
    fn list(&self, path: &str) -> StoreResult<Option<Vec<String>>>;

    /// Returns `true` only for leaf resources.
    fn exists(&self, path: &str) -> StoreResult<bool>;

    /// Read a resource's content and version.
    ///
    /// Returns `Ok(None)` if the resource does not exist.
    fn get(&self, path: &str) -> StoreResult<Option<Resource>>;

    /// Read a resource's version, or `0` if it does not exist.
    fn get_version(&self, path: &str) -> StoreResult<Version>;

    /// Unconditionally overwrite a resource, creating parent folders.
    ///
    /// The stored version is set as close to `version` as the backend
    /// allows. Callers that need the exact stored value must re-query it
    /// with [`ResourceStore::get_version`].
    fn put(&self, path: &str, content: &[u8], version: Version) -> StoreResult<()>;

    /// Write only if the current version equals `expected_old`.
    ///
    /// An absent resource matches only `expected_old == 0`. On success
    /// returns the effective stored version, re-read after the write, which
    /// may differ from `new_version` on backends that lose precision but is
    /// always strictly greater than the version it replaced. On
    /// mismatch fails with [`crate::StoreError::Conflict`] and leaves the
    /// store unchanged.
    fn check_and_put(
        &self,
        path: &str,
        content: &[u8],
        expected_old: Version,
        new_version: Version,
    ) -> StoreResult<Version>;

    /// Remove a resource. Absent resources are a no-op, not an error.
    fn delete(&self, path: &str) -> StoreResult<()>;

    /// Human-readable location of a path, for log messages.
    fn readable_path(&self, path: &str) -> String;

    /// Every leaf resource below a folder, sorted.
    ///
    /// Default implementation walks [`ResourceStore::list`]. Returns an
    /// empty list if `path` is not directory-like.
    fn list_recursive(&self, path: &str) -> StoreResult<Vec<String>> {
        let mut found = Vec::new();
        let mut pending = vec![path.to_string()];
        while let Some(folder) = pending.pop() {
            let Some(children) = self.list(&folder)? else {
                continue;
            };
            for child in children {
                if self.exists(&child)? {
                    found.push(child);
                } else {
                    pending.push(child);
                }
            }
        }
        found.sort();
        Ok(found)
    }
}
