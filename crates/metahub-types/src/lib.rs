//! Foundation types for metahub.
//!
//! metahub is the metadata persistence and cache-coherence layer of a
//! clustered analytics service. Every other metahub crate depends on
//! `metahub-types`.
//!
//! # Key Types
//!
//! - [`EntityType`] -- which cached subsystem an event concerns
//! - [`EventKind`] -- closed set of change kinds: create, update, drop
//! - [`BroadcastEvent`] -- the `(entity type, entity name, event kind)` tuple
//!   announced to peers after a committed local mutation
//! - [`PeerNode`] -- a static cluster member address
//! - [`version`] -- version-timestamp helpers shared by writers

pub mod entity;
pub mod error;
pub mod event;
pub mod peer;
pub mod version;

pub use entity::EntityType;
pub use error::TypeError;
pub use event::{BroadcastEvent, EventKind};
pub use peer::PeerNode;
pub use version::{current_version, next_version, Version, ABSENT_VERSION};
