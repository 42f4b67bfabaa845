//! Versioned resource storage for metahub.
//!
//! The resource store is the single authoritative copy of all shared
//! metadata. Every resource is an opaque byte blob addressed by a
//! hierarchical path (`/cube/sales.json`) and versioned by a last-modified
//! timestamp. Concurrent mutation is made safe without transactions through
//! per-path compare-and-swap writes keyed on that version.
//!
//! # Storage Backends
//!
//! All backends implement the [`ResourceStore`] trait:
//!
//! - [`FileResourceStore`] -- maps paths onto a directory tree
//! - [`InMemoryResourceStore`] -- `BTreeMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. A path names exactly one resource or nothing. A path that only has
//!    children acts as a directory and is never itself a resource.
//! 2. `check_and_put` is atomic per path: two callers presenting the same
//!    expected version never both succeed.
//! 3. A CAS mismatch is a [`StoreError::Conflict`] and is never retried here.
//! 4. A missing resource is `Ok(None)`, never an I/O error.
//! 5. The store never interprets resource contents.

pub mod entity;
pub mod error;
pub mod file;
pub mod lock;
pub mod memory;
pub mod path;
pub mod traits;

pub use entity::{read_entity, write_entity_cas, VersionedEntity};
pub use error::{StoreError, StoreResult};
pub use file::FileResourceStore;
pub use lock::PathLocks;
pub use memory::InMemoryResourceStore;
pub use traits::{Resource, ResourceStore};
