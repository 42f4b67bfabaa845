use metahub_store::VersionedEntity;
use metahub_types::EntityType;

/// A metadata entity that lives in the resource store and is cached per node.
pub trait CachedEntity: VersionedEntity + Send + Sync + 'static {
    /// Entity type tag used in broadcast events.
    const TYPE: EntityType;

    /// Name the entity is cached and announced under.
    fn cache_key(&self) -> String;

    /// Canonical form of an announced name, e.g. upper-case table identities.
    fn normalize_key(name: &str) -> String {
        name.to_string()
    }

    /// Resource path of the named entity.
    fn path_of(name: &str) -> String {
        let key = Self::normalize_key(name);
        match Self::TYPE.resource_path(&key) {
            Some(path) => path,
            None => format!("/{key}.json"),
        }
    }

    fn resource_path(&self) -> String {
        Self::path_of(&self.cache_key())
    }
}
