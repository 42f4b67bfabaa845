//! Typed JSON entities on top of a [`ResourceStore`].
//!
//! An entity carries its own `last_modified` stamp. Reading copies the
//! stored version into the entity; writing uses the entity's current stamp
//! as the expected version, so a stale copy is rejected with
//! [`StoreError::Conflict`].

use serde::de::DeserializeOwned;
use serde::Serialize;

use metahub_types::{next_version, Version};

use crate::error::{StoreError, StoreResult};
use crate::traits::ResourceStore;

/// A JSON-serialized metadata entity with an embedded version stamp.
pub trait VersionedEntity: Serialize + DeserializeOwned {
    fn last_modified(&self) -> Version;
    fn set_last_modified(&mut self, version: Version);
}

/// Read and deserialize an entity, stamping it with the stored version.
pub fn read_entity<T, S>(store: &S, path: &str) -> StoreResult<Option<T>>
where
    T: VersionedEntity,
    S: ResourceStore + ?Sized,
{
    let Some(resource) = store.get(path)? else {
        return Ok(None);
    };
    let mut entity: T = serde_json::from_slice(&resource.content)
        .map_err(|e| StoreError::Serialization(format!("{}: {e}", store.readable_path(path))))?;
    entity.set_last_modified(resource.version);
    Ok(Some(entity))
}

/// Serialize and conditionally write an entity.
///
/// The entity's current `last_modified` is the expected version. On success
/// the entity is stamped with the effective stored version; on any failure
/// it keeps its previous stamp.
pub fn write_entity_cas<T, S>(store: &S, path: &str, entity: &mut T) -> StoreResult<Version>
where
    T: VersionedEntity,
    S: ResourceStore + ?Sized,
{
    let old = entity.last_modified();
    let new = next_version(old);
    entity.set_last_modified(new);

    let result = serde_json::to_vec_pretty(entity)
        .map_err(StoreError::from)
        .and_then(|content| store.check_and_put(path, &content, old, new));

    match result {
        Ok(effective) => {
            entity.set_last_modified(effective);
            Ok(effective)
        }
        Err(e) => {
            entity.set_last_modified(old);
            Err(e)
        }
    }
}
