use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard};

/// Default number of lock stripes.
pub const DEFAULT_STRIPES: usize = 64;

/// Striped per-path mutual exclusion.
///
/// Each path hashes onto one of a fixed set of mutexes. Writers to the same
/// path always contend on the same stripe; writers to different paths
/// usually do not. Exclusion is per process only.
#[derive(Debug)]
pub struct PathLocks {
    stripes: Vec<Mutex<()>>,
}

impl PathLocks {
    /// Create a lock table with `stripes` mutexes (at least one).
    pub fn new(stripes: usize) -> Self {
        Self {
            stripes: (0..stripes.max(1)).map(|_| Mutex::new(())).collect(),
        }
    }

    /// Block until the stripe owning `path` is held.
    pub fn lock(&self, path: &str) -> MutexGuard<'_, ()> {
        // The guarded value is `()`, so a poisoned stripe carries no broken state.
        self.stripes[self.stripe_of(path)]
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn stripe_of(&self, path: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        (hasher.finish() % self.stripes.len() as u64) as usize
    }
}

impl Default for PathLocks {
    fn default() -> Self {
        Self::new(DEFAULT_STRIPES)
    }
}
