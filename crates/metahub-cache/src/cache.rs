use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A concurrent name-keyed map of cached entities.
///
/// Values are shared as `Arc<T>`; a rebuild swaps in a new `Arc`, so
/// readers holding the old one keep a consistent snapshot.
#[derive(Debug)]
pub struct EntityCache<T> {
    entries: RwLock<HashMap<String, Arc<T>>>,
}

impl<T> EntityCache<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<T>> {
        self.entries
            .read()
            .expect("cache lock poisoned")
            .get(name)
            .cloned()
    }

    /// Insert or replace an entry, returning the previous one.
    pub fn insert(&self, name: impl Into<String>, value: Arc<T>) -> Option<Arc<T>> {
        self.entries
            .write()
            .expect("cache lock poisoned")
            .insert(name.into(), value)
    }

    pub fn remove(&self, name: &str) -> Option<Arc<T>> {
        self.entries
            .write()
            .expect("cache lock poisoned")
            .remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries
            .read()
            .expect("cache lock poisoned")
            .contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .read()
            .expect("cache lock poisoned")
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Snapshot of all values.
    pub fn values(&self) -> Vec<Arc<T>> {
        self.entries
            .read()
            .expect("cache lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.entries.write().expect("cache lock poisoned").clear();
    }
}

impl<T> Default for EntityCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
