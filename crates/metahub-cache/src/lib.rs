//! Node-local metadata caches for metahub.
//!
//! Every node keeps in-memory copies of the metadata it reads often. The
//! [`CacheService`] owns them and keeps them coherent with the resource
//! store by reacting to broadcast events:
//!
//! - `CREATE` / `UPDATE` -- discard the entry and reload it from the store
//! - `DROP` -- evict the entry
//!
//! Some entity types cascade: a cube change rebuilds the projects that
//! realize it, and a table change rebuilds the data models that use it.
//! The `all` entity type asks for a full resync.

pub mod cache;
pub mod cube;
pub mod entity;
pub mod error;
pub mod model;
pub mod project;
pub mod service;
pub mod table;

pub use cache::EntityCache;
pub use cube::{CubeDesc, CubeInstance, CubeSegment, CubeStatus, SegmentStatus};
pub use entity::CachedEntity;
pub use error::{CacheError, CacheResult};
pub use model::DataModelDesc;
pub use project::{ProjectInstance, RealizationEntry};
pub use service::{BroadcastHandler, CacheService, CacheStats, HandleOutcome};
pub use table::{ColumnDesc, TableDesc};
