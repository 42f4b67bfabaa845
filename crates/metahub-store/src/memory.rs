//! In-memory resource store for testing and embedding.
//!
//! [`InMemoryResourceStore`] keeps every resource in a `BTreeMap` behind a
//! `RwLock`. Folders are implied by the paths of the resources below them.
//! A configurable version granularity lets tests reproduce backends that
//! round timestamps.

use std::collections::BTreeMap;
use std::sync::RwLock;

use metahub_types::{Version, ABSENT_VERSION};

use crate::error::{StoreError, StoreResult};
use crate::path::{self, ROOT};
use crate::traits::{Resource, ResourceStore};

/// An in-memory implementation of [`ResourceStore`].
///
/// Data is lost when the store is dropped. Compare-and-swap runs under the
/// store-wide write lock.
#[derive(Debug)]
pub struct InMemoryResourceStore {
    resources: RwLock<BTreeMap<String, Resource>>,
    granularity_ms: Version,
}

impl InMemoryResourceStore {
    /// Create an empty store with exact version fidelity.
    pub fn new() -> Self {
        Self::with_granularity(1)
    }

    /// Create an empty store that rounds stored versions down to a multiple
    /// of `granularity_ms`.
    pub fn with_granularity(granularity_ms: Version) -> Self {
        Self {
            resources: RwLock::new(BTreeMap::new()),
            granularity_ms: granularity_ms.max(1),
        }
    }

    /// Number of stored resources.
    pub fn len(&self) -> usize {
        self.resources.read().expect("store lock poisoned").len()
    }

    /// Returns `true` if the store holds no resources.
    pub fn is_empty(&self) -> bool {
        self.resources.read().expect("store lock poisoned").is_empty()
    }

    fn effective(&self, version: Version) -> Version {
        version - version % self.granularity_ms
    }

    /// A requested version that survives rounding strictly above `current`.
    fn successor(&self, current: Version, requested: Version) -> Version {
        let version = requested.max(current.saturating_add(1));
        if self.effective(version) > current {
            version
        } else {
            self.effective(current) + self.granularity_ms
        }
    }

    fn folder_prefix(folder: &str) -> String {
        if folder == ROOT {
            ROOT.to_string()
        } else {
            format!("{folder}/")
        }
    }

    /// Reject writes that would make a path both a resource and a folder.
    fn check_shape(map: &BTreeMap<String, Resource>, resource_path: &str) -> StoreResult<()> {
        if let Some(ancestor) = path::ancestors(resource_path).find(|a| map.contains_key(*a)) {
            return Err(StoreError::invalid_path(
                resource_path,
                format!("ancestor {ancestor} is a resource"),
            ));
        }
        let prefix = Self::folder_prefix(resource_path);
        if map.range(prefix.clone()..).next().is_some_and(|(k, _)| k.starts_with(&prefix)) {
            return Err(StoreError::invalid_path(resource_path, "path is a directory"));
        }
        Ok(())
    }

    fn insert(
        &self,
        map: &mut BTreeMap<String, Resource>,
        resource_path: &str,
        content: &[u8],
        version: Version,
    ) -> StoreResult<Version> {
        Self::check_shape(map, resource_path)?;
        let effective = self.effective(version);
        map.insert(
            resource_path.to_string(),
            Resource::new(content.to_vec(), effective),
        );
        Ok(effective)
    }
}

impl Default for InMemoryResourceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceStore for InMemoryResourceStore {
    fn list(&self, folder: &str) -> StoreResult<Option<Vec<String>>> {
        path::validate(folder)?;
        let map = self.resources.read().expect("store lock poisoned");
        let prefix = Self::folder_prefix(folder);
        let mut children: Vec<String> = Vec::new();
        for key in map.range(prefix.clone()..).map(|(k, _)| k) {
            let Some(rest) = key.strip_prefix(&prefix) else {
                break;
            };
            let name = rest.split('/').next().unwrap_or(rest);
            let child = path::child(folder, name);
            if children.last() != Some(&child) {
                children.push(child);
            }
        }
        if children.is_empty() && folder != ROOT {
            return Ok(None);
        }
        Ok(Some(children))
    }

    fn exists(&self, resource_path: &str) -> StoreResult<bool> {
        path::validate_resource(resource_path)?;
        let map = self.resources.read().expect("store lock poisoned");
        Ok(map.contains_key(resource_path))
    }

    fn get(&self, resource_path: &str) -> StoreResult<Option<Resource>> {
        path::validate_resource(resource_path)?;
        let map = self.resources.read().expect("store lock poisoned");
        Ok(map.get(resource_path).cloned())
    }

    fn get_version(&self, resource_path: &str) -> StoreResult<Version> {
        path::validate_resource(resource_path)?;
        let map = self.resources.read().expect("store lock poisoned");
        Ok(map
            .get(resource_path)
            .map(|r| r.version)
            .unwrap_or(ABSENT_VERSION))
    }

    fn put(&self, resource_path: &str, content: &[u8], version: Version) -> StoreResult<()> {
        path::validate_resource(resource_path)?;
        let mut map = self.resources.write().expect("store lock poisoned");
        self.insert(&mut map, resource_path, content, version)?;
        Ok(())
    }

    fn check_and_put(
        &self,
        resource_path: &str,
        content: &[u8],
        expected_old: Version,
        new_version: Version,
    ) -> StoreResult<Version> {
        path::validate_resource(resource_path)?;
        let mut map = self.resources.write().expect("store lock poisoned");
        let found = map.get(resource_path).map(|r| r.version);
        let matches = match found {
            Some(v) => v == expected_old,
            None => expected_old == ABSENT_VERSION,
        };
        if !matches {
            return Err(StoreError::Conflict {
                path: resource_path.to_string(),
                expected: expected_old,
                found: found.unwrap_or(ABSENT_VERSION),
            });
        }
        let version = self.successor(found.unwrap_or(ABSENT_VERSION), new_version);
        self.insert(&mut map, resource_path, content, version)
    }

    fn delete(&self, resource_path: &str) -> StoreResult<()> {
        path::validate_resource(resource_path)?;
        let mut map = self.resources.write().expect("store lock poisoned");
        map.remove(resource_path);
        Ok(())
    }

    fn readable_path(&self, resource_path: &str) -> String {
        format!("memory:{resource_path}")
    }
}
