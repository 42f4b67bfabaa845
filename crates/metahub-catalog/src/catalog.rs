use std::sync::Arc;

use tracing::{error, info, warn};

use metahub_broadcast::Broadcaster;
use metahub_cache::{
    CacheService, CachedEntity, CubeDesc, CubeInstance, DataModelDesc, ProjectInstance,
    RealizationEntry, TableDesc,
};
use metahub_store::{path, read_entity, write_entity_cas, ResourceStore};
use metahub_types::{EntityType, EventKind, Version};

use crate::error::{CatalogError, CatalogResult};

/// Attempts at a read-modify-write of a project index before giving up.
pub const INDEX_UPDATE_ATTEMPTS: usize = 3;

/// The metadata manager layer.
///
/// Every mutating operation follows the same commit path: a compare-and-swap
/// write to the resource store, a refresh of this node's cache, then the
/// announcements that operation declares. A failed write announces nothing;
/// a write that landed is announced even if a later step of the same
/// operation fails.
pub struct Catalog {
    store: Arc<dyn ResourceStore>,
    cache: Arc<CacheService>,
    broadcaster: Arc<Broadcaster>,
}

impl Catalog {
    pub fn new(store: Arc<dyn ResourceStore>, cache: Arc<CacheService>, broadcaster: Arc<Broadcaster>) -> Self {
        Self {
            store,
            cache,
            broadcaster,
        }
    }

    pub fn store(&self) -> &Arc<dyn ResourceStore> {
        &self.store
    }

    pub fn cache(&self) -> &Arc<CacheService> {
        &self.cache
    }

    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.broadcaster
    }

    // ---- Reads ----

    /// Read an entity straight from the store, bypassing the cache.
    pub fn load<T: CachedEntity>(&self, name: &str) -> CatalogResult<Option<T>> {
        Ok(read_entity(self.store.as_ref(), &T::path_of(name))?)
    }

    fn require<T: CachedEntity>(&self, name: &str) -> CatalogResult<T> {
        self.load(name)?
            .ok_or_else(|| CatalogError::not_found(T::TYPE, name))
    }

    fn ensure_absent<T: CachedEntity>(&self, name: &str) -> CatalogResult<()> {
        if self.store.exists(&T::path_of(name))? {
            return Err(CatalogError::already_exists(T::TYPE, name));
        }
        Ok(())
    }

    // ---- Cube descriptors ----

    /// Announces CUBE_DESC/CREATE.
    pub fn create_cube_desc(&self, desc: &mut CubeDesc) -> CatalogResult<Version> {
        self.ensure_absent::<CubeDesc>(&desc.name)?;
        desc.last_modified = 0;
        let version = self.commit(desc)?;
        self.publish(EntityType::CubeDesc, &desc.name, EventKind::Create);
        Ok(version)
    }

    /// Announces CUBE_DESC/UPDATE.
    pub fn update_cube_desc(&self, desc: &mut CubeDesc) -> CatalogResult<Version> {
        let version = self.commit(desc)?;
        self.publish(EntityType::CubeDesc, &desc.name, EventKind::Update);
        Ok(version)
    }

    /// Announces CUBE_DESC/DROP.
    pub fn remove_cube_desc(&self, name: &str) -> CatalogResult<()> {
        let in_use: Vec<String> = self
            .cubes_in_store()?
            .into_iter()
            .filter(|c| c.desc_name == name)
            .map(|c| c.name)
            .collect();
        if !in_use.is_empty() {
            return Err(CatalogError::InvalidOperation(format!(
                "cube descriptor {name} is used by cubes {in_use:?}"
            )));
        }
        self.delete::<CubeDesc>(name)?;
        self.publish(EntityType::CubeDesc, name, EventKind::Drop);
        Ok(())
    }

    // ---- Cubes ----

    /// Create a cube from a descriptor and register it with a project.
    ///
    /// Announces CUBE/CREATE and PROJECT/UPDATE. If the project cannot be
    /// updated the cube stays stored and announced, and the error is returned.
    pub fn create_cube(&self, name: &str, project: &str, desc_name: &str) -> CatalogResult<CubeInstance> {
        self.ensure_absent::<CubeInstance>(name)?;
        self.require::<ProjectInstance>(project)?;
        self.require::<CubeDesc>(desc_name)?;

        let mut cube = CubeInstance::new(name, desc_name);
        self.commit(&mut cube)?;
        self.publish(EntityType::Cube, name, EventKind::Create);

        if let Err(e) = self.modify_project(project, |p| p.realizations.insert(RealizationEntry::cube(name))) {
            warn!(cube = name, project, error = %e, "cube stored but not registered with its project");
            return Err(e);
        }
        self.publish(EntityType::Project, project, EventKind::Update);
        info!(cube = name, project, "cube created");
        Ok(cube)
    }

    /// Announces CUBE/UPDATE.
    pub fn update_cube(&self, cube: &mut CubeInstance) -> CatalogResult<Version> {
        let version = self.commit(cube)?;
        self.publish(EntityType::Cube, &cube.name, EventKind::Update);
        Ok(version)
    }

    /// Delete a cube and unregister it from every project realizing it.
    ///
    /// Announces CUBE/DROP and PROJECT/UPDATE for each affected project.
    /// Once the cube is deleted every project is still visited; the first
    /// project that could not be read or updated is reported afterwards.
    pub fn drop_cube(&self, name: &str) -> CatalogResult<()> {
        self.require::<CubeInstance>(name)?;
        self.delete::<CubeInstance>(name)?;
        self.publish(EntityType::Cube, name, EventKind::Drop);

        let mut affected = Vec::new();
        let mut first_error = None;
        for resource in self.resources_of::<ProjectInstance>()? {
            match self.unregister_cube(&resource, name) {
                Ok(Some(project)) => {
                    self.publish(EntityType::Project, &project, EventKind::Update);
                    affected.push(project);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(cube = name, resource = %resource, error = %e, "project not updated after cube drop");
                    first_error.get_or_insert(e);
                }
            }
        }
        info!(cube = name, projects = ?affected, "cube dropped");
        first_error.map_or(Ok(()), Err)
    }

    /// Remove a cube from the project stored at `resource`, returning the
    /// project's name if it realized the cube.
    fn unregister_cube(&self, resource: &str, cube: &str) -> CatalogResult<Option<String>> {
        let Some(project) = read_entity::<ProjectInstance, _>(self.store.as_ref(), resource)? else {
            return Ok(None);
        };
        if !project.contains_cube(cube) {
            return Ok(None);
        }
        self.modify_project(&project.name, |p| p.realizations.remove(&RealizationEntry::cube(cube)))?;
        Ok(Some(project.name))
    }

    // ---- Projects ----

    /// Announces PROJECT/CREATE.
    pub fn create_project(&self, name: &str, description: &str) -> CatalogResult<ProjectInstance> {
        self.ensure_absent::<ProjectInstance>(name)?;
        let mut project = ProjectInstance::new(name);
        project.description = description.to_string();
        self.commit(&mut project)?;
        self.publish(EntityType::Project, name, EventKind::Create);
        Ok(project)
    }

    /// Delete an empty project. Announces PROJECT/DROP.
    pub fn drop_project(&self, name: &str) -> CatalogResult<()> {
        let project = self.require::<ProjectInstance>(name)?;
        if !project.realizations.is_empty() {
            return Err(CatalogError::InvalidOperation(format!(
                "project {name} still has {} realizations",
                project.realizations.len()
            )));
        }
        self.delete::<ProjectInstance>(name)?;
        self.publish(EntityType::Project, name, EventKind::Drop);
        Ok(())
    }

    // ---- Tables and models ----

    /// Create or overwrite source table metadata.
    ///
    /// Announces TABLE/CREATE for a new table, TABLE/UPDATE otherwise.
    pub fn save_source_table(&self, table: &mut TableDesc) -> CatalogResult<Version> {
        let identity = table.identity();
        let kind = if self.store.exists(&table.resource_path())? {
            EventKind::Update
        } else {
            EventKind::Create
        };
        let version = self.commit(table)?;
        self.publish(EntityType::Table, &identity, kind);
        Ok(version)
    }

    /// Announces DATA_MODEL/CREATE.
    pub fn create_data_model(&self, model: &mut DataModelDesc) -> CatalogResult<Version> {
        self.ensure_absent::<DataModelDesc>(&model.name)?;
        model.last_modified = 0;
        let version = self.commit(model)?;
        self.publish(EntityType::DataModel, &model.name, EventKind::Create);
        Ok(version)
    }

    /// Announces DATA_MODEL/UPDATE.
    pub fn update_data_model(&self, model: &mut DataModelDesc) -> CatalogResult<Version> {
        let version = self.commit(model)?;
        self.publish(EntityType::DataModel, &model.name, EventKind::Update);
        Ok(version)
    }

    // ---- Commit path ----

    /// CAS-write an entity, then refresh this node's cache entry.
    fn commit<T: CachedEntity>(&self, entity: &mut T) -> CatalogResult<Version> {
        let path = entity.resource_path();
        let version = write_entity_cas(self.store.as_ref(), &path, entity).map_err(|e| {
            if e.is_conflict() {
                warn!(path = %path, error = %e, "write rejected by concurrent modification");
            }
            e
        })?;
        self.refresh(T::TYPE, &entity.cache_key());
        Ok(version)
    }

    fn delete<T: CachedEntity>(&self, name: &str) -> CatalogResult<()> {
        self.store.delete(&T::path_of(name))?;
        self.cache.remove(T::TYPE, &T::normalize_key(name));
        Ok(())
    }

    /// Re-read a project, apply `change`, and write it back.
    ///
    /// A lost race re-reads and retries; `change` must be safe to reapply.
    fn modify_project<F>(&self, name: &str, change: F) -> CatalogResult<()>
    where
        F: Fn(&mut ProjectInstance) -> bool,
    {
        let mut attempt = 1;
        loop {
            let mut project = self.require::<ProjectInstance>(name)?;
            if !change(&mut project) {
                return Ok(());
            }
            match self.commit(&mut project) {
                Err(e) if e.is_conflict() && attempt < INDEX_UPDATE_ATTEMPTS => attempt += 1,
                other => return other.map(|_| ()),
            }
        }
    }

    fn refresh(&self, entity_type: EntityType, name: &str) {
        if let Err(e) = self.cache.rebuild(entity_type, name) {
            error!(%entity_type, name, error = %e, "local cache refresh failed after commit");
        }
    }

    fn publish(&self, entity_type: EntityType, name: &str, kind: EventKind) {
        self.broadcaster.announce(entity_type, name, kind);
    }

    fn cubes_in_store(&self) -> CatalogResult<Vec<CubeInstance>> {
        self.all_in_store()
    }

    /// Paths of every stored entity of type `T`.
    fn resources_of<T: CachedEntity>(&self) -> CatalogResult<Vec<String>> {
        let Some(root) = T::TYPE.resource_root() else {
            return Ok(Vec::new());
        };
        Ok(self
            .store
            .list_recursive(root)?
            .into_iter()
            .filter(|resource| path::file_name(resource).ends_with(".json"))
            .collect())
    }

    fn all_in_store<T: CachedEntity>(&self) -> CatalogResult<Vec<T>> {
        let mut found = Vec::new();
        for resource in self.resources_of::<T>()? {
            if let Some(entity) = read_entity(self.store.as_ref(), &resource)? {
                found.push(entity);
            }
        }
        Ok(found)
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("cache", &self.cache)
            .field("broadcaster", &self.broadcaster)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use metahub_broadcast::{BroadcastResult, BroadcasterConfig, PeerTransport};
    use metahub_store::{InMemoryResourceStore, Resource, StoreError, StoreResult};
    use metahub_types::{BroadcastEvent, PeerNode};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::runtime::Handle;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<BroadcastEvent>>,
    }

    #[async_trait]
    impl PeerTransport for Recorder {
        async fn deliver(&self, _peer: &PeerNode, event: &BroadcastEvent) -> BroadcastResult<()> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    /// In-memory store whose writes can be made to fail below a prefix.
    #[derive(Default)]
    struct FlakyStore {
        inner: InMemoryResourceStore,
        failing: Mutex<Option<String>>,
    }

    impl FlakyStore {
        fn fail_writes_under(&self, prefix: &str) {
            *self.failing.lock().unwrap() = Some(prefix.to_string());
        }

        fn check_write(&self, path: &str) -> StoreResult<()> {
            match self.failing.lock().unwrap().as_deref() {
                Some(prefix) if path.starts_with(prefix) => {
                    Err(StoreError::Io(std::io::Error::other("disk full")))
                }
                _ => Ok(()),
            }
        }
    }

    impl ResourceStore for FlakyStore {
        fn list(&self, path: &str) -> StoreResult<Option<Vec<String>>> {
            self.inner.list(path)
        }

        fn exists(&self, path: &str) -> StoreResult<bool> {
            self.inner.exists(path)
        }

        fn get(&self, path: &str) -> StoreResult<Option<Resource>> {
            self.inner.get(path)
        }

        fn get_version(&self, path: &str) -> StoreResult<Version> {
            self.inner.get_version(path)
        }

        fn put(&self, path: &str, content: &[u8], version: Version) -> StoreResult<()> {
            self.check_write(path)?;
            self.inner.put(path, content, version)
        }

        fn check_and_put(&self, path: &str, content: &[u8], old: Version, new: Version) -> StoreResult<Version> {
            self.check_write(path)?;
            self.inner.check_and_put(path, content, old, new)
        }

        fn delete(&self, path: &str) -> StoreResult<()> {
            self.check_write(path)?;
            self.inner.delete(path)
        }

        fn readable_path(&self, path: &str) -> String {
            self.inner.readable_path(path)
        }
    }

    struct Fixture {
        catalog: Catalog,
        store: Arc<FlakyStore>,
        recorder: Arc<Recorder>,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(FlakyStore::default());
            let cache = Arc::new(CacheService::new(store.clone()));
            let recorder = Arc::new(Recorder::default());
            let config = BroadcasterConfig::new(vec![PeerNode::parse("peer:1").unwrap()]);
            let broadcaster = Arc::new(Broadcaster::with_transport(config, recorder.clone(), Handle::current()));
            let catalog = Catalog::new(store.clone(), cache, broadcaster);
            Self {
                catalog,
                store,
                recorder,
            }
        }

        fn announced(&self) -> u64 {
            self.catalog.broadcaster().counter().get()
        }

        async fn events(&self) -> Vec<BroadcastEvent> {
            self.catalog.broadcaster().shutdown(Duration::from_secs(5)).await;
            self.recorder.events.lock().unwrap().clone()
        }

        fn seed_project_and_desc(&self) {
            self.catalog.create_project("default", "").unwrap();
            let mut desc = CubeDesc::new("sales_desc", "sales_model");
            self.catalog.create_cube_desc(&mut desc).unwrap();
            self.catalog.broadcaster().counter().reset();
        }
    }

    fn ev(entity_type: EntityType, name: &str, kind: EventKind) -> BroadcastEvent {
        BroadcastEvent::new(entity_type, name, kind)
    }

    #[tokio::test]
    async fn create_cube_announces_cube_and_project() {
        let fx = Fixture::new();
        fx.seed_project_and_desc();

        let cube = fx.catalog.create_cube("sales", "default", "sales_desc").unwrap();
        assert_eq!(fx.announced(), 2);
        assert!(cube.last_modified > 0);

        let cached = fx.catalog.cache().cube("sales").unwrap();
        assert_eq!(*cached, cube);
        assert!(fx.catalog.cache().project("default").unwrap().contains_cube("sales"));

        let events = fx.events().await;
        assert!(events.ends_with(&[
            ev(EntityType::Cube, "sales", EventKind::Create),
            ev(EntityType::Project, "default", EventKind::Update),
        ]));
    }

    #[tokio::test]
    async fn create_cube_requires_project_and_desc() {
        let fx = Fixture::new();
        let err = fx.catalog.create_cube("c", "nope", "d").unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { entity_type: EntityType::Project, .. }));

        fx.catalog.create_project("p", "").unwrap();
        let err = fx.catalog.create_cube("c", "p", "missing").unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { entity_type: EntityType::CubeDesc, .. }));
        assert!(!fx.store.exists("/cube/c.json").unwrap());
        assert_eq!(fx.announced(), 1);
    }

    #[tokio::test]
    async fn duplicate_create_is_rejected_without_announce() {
        let fx = Fixture::new();
        fx.seed_project_and_desc();
        fx.catalog.create_cube("sales", "default", "sales_desc").unwrap();
        fx.catalog.broadcaster().counter().reset();

        let err = fx.catalog.create_cube("sales", "default", "sales_desc").unwrap_err();
        assert!(matches!(err, CatalogError::AlreadyExists { .. }));
        assert_eq!(fx.announced(), 0);
    }

    #[tokio::test]
    async fn update_cube_announces_once() {
        let fx = Fixture::new();
        fx.seed_project_and_desc();
        let mut cube = fx.catalog.create_cube("sales", "default", "sales_desc").unwrap();
        fx.catalog.broadcaster().counter().reset();

        cube.segments.push(metahub_cache::CubeSegment::new("s1"));
        let version = fx.catalog.update_cube(&mut cube).unwrap();
        assert_eq!(fx.announced(), 1);
        assert_eq!(cube.last_modified, version);
        assert_eq!(fx.catalog.cache().cube("sales").unwrap().segments.len(), 1);
    }

    #[tokio::test]
    async fn stale_update_conflicts_and_announces_nothing() {
        let fx = Fixture::new();
        fx.seed_project_and_desc();
        let cube = fx.catalog.create_cube("sales", "default", "sales_desc").unwrap();

        let mut first = cube.clone();
        let mut stale = cube;
        fx.catalog.update_cube(&mut first).unwrap();
        fx.catalog.broadcaster().counter().reset();

        stale.status = metahub_cache::CubeStatus::Ready;
        let err = fx.catalog.update_cube(&mut stale).unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(fx.announced(), 0);
        assert_eq!(
            fx.catalog.cache().cube("sales").unwrap().status,
            metahub_cache::CubeStatus::Disabled
        );
    }

    #[tokio::test]
    async fn drop_cube_unregisters_and_announces_twice() {
        let fx = Fixture::new();
        fx.seed_project_and_desc();
        fx.catalog.create_cube("sales", "default", "sales_desc").unwrap();
        fx.catalog.broadcaster().counter().reset();

        fx.catalog.drop_cube("sales").unwrap();
        assert_eq!(fx.announced(), 2);
        assert!(fx.catalog.cache().cube("sales").is_none());
        assert!(!fx.store.exists("/cube/sales.json").unwrap());
        assert!(!fx.catalog.cache().project("default").unwrap().contains_cube("sales"));

        let err = fx.catalog.drop_cube("sales").unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { .. }));
    }

    #[tokio::test]
    async fn drop_cube_announces_even_when_a_project_is_unreadable() {
        let fx = Fixture::new();
        fx.seed_project_and_desc();
        fx.catalog.create_cube("sales", "default", "sales_desc").unwrap();
        fx.store.put("/project/broken.json", b"{not json", 1).unwrap();
        fx.catalog.broadcaster().counter().reset();

        let err = fx.catalog.drop_cube("sales").unwrap_err();
        assert!(matches!(err, CatalogError::Store(StoreError::Serialization(_))));
        assert!(!fx.store.exists("/cube/sales.json").unwrap());
        assert!(fx.catalog.cache().cube("sales").is_none());
        assert_eq!(fx.announced(), 2);
        assert!(!fx.catalog.cache().project("default").unwrap().contains_cube("sales"));

        let events = fx.events().await;
        assert!(events.ends_with(&[
            ev(EntityType::Cube, "sales", EventKind::Drop),
            ev(EntityType::Project, "default", EventKind::Update),
        ]));
    }

    #[tokio::test]
    async fn create_cube_announces_cube_when_project_write_fails() {
        let fx = Fixture::new();
        fx.seed_project_and_desc();
        fx.store.fail_writes_under("/project/");

        let err = fx.catalog.create_cube("sales", "default", "sales_desc").unwrap_err();
        assert!(matches!(err, CatalogError::Store(StoreError::Io(_))));
        assert!(fx.store.exists("/cube/sales.json").unwrap());
        assert!(fx.catalog.cache().cube("sales").is_some());
        assert_eq!(fx.announced(), 1);
        assert!(!fx.catalog.cache().project("default").unwrap().contains_cube("sales"));

        let events = fx.events().await;
        assert_eq!(events.last(), Some(&ev(EntityType::Cube, "sales", EventKind::Create)));
    }

    #[tokio::test]
    async fn cube_desc_lifecycle_announces_each_step() {
        let fx = Fixture::new();
        let mut desc = CubeDesc::new("d", "m");
        fx.catalog.create_cube_desc(&mut desc).unwrap();
        assert_eq!(fx.announced(), 1);

        desc.dimensions.push("REGION".into());
        fx.catalog.update_cube_desc(&mut desc).unwrap();
        assert_eq!(fx.announced(), 2);
        assert_eq!(fx.catalog.cache().cube_desc("d").unwrap().dimensions, vec!["REGION"]);

        fx.catalog.remove_cube_desc("d").unwrap();
        assert_eq!(fx.announced(), 3);
        assert!(fx.catalog.cache().cube_desc("d").is_none());

        let events = fx.events().await;
        assert_eq!(
            events,
            vec![
                ev(EntityType::CubeDesc, "d", EventKind::Create),
                ev(EntityType::CubeDesc, "d", EventKind::Update),
                ev(EntityType::CubeDesc, "d", EventKind::Drop),
            ]
        );
    }

    #[tokio::test]
    async fn cube_desc_in_use_cannot_be_removed() {
        let fx = Fixture::new();
        fx.seed_project_and_desc();
        fx.catalog.create_cube("sales", "default", "sales_desc").unwrap();
        let err = fx.catalog.remove_cube_desc("sales_desc").unwrap_err();
        assert!(matches!(err, CatalogError::InvalidOperation(_)));
    }

    #[tokio::test]
    async fn project_drop_requires_empty() {
        let fx = Fixture::new();
        fx.seed_project_and_desc();
        fx.catalog.create_cube("sales", "default", "sales_desc").unwrap();
        assert!(fx.catalog.drop_project("default").is_err());

        fx.catalog.drop_cube("sales").unwrap();
        fx.catalog.drop_project("default").unwrap();
        assert!(fx.catalog.cache().project("default").is_none());
    }

    #[tokio::test]
    async fn save_source_table_create_then_update() {
        let fx = Fixture::new();
        let mut table = TableDesc::new("default", "fact");
        fx.catalog.save_source_table(&mut table).unwrap();
        table.columns.push(metahub_cache::ColumnDesc {
            name: "ID".into(),
            datatype: "bigint".into(),
        });
        fx.catalog.save_source_table(&mut table).unwrap();
        assert_eq!(fx.announced(), 2);
        assert_eq!(fx.catalog.cache().table("default.fact").unwrap().columns.len(), 1);

        let events = fx.events().await;
        assert_eq!(
            events,
            vec![
                ev(EntityType::Table, "DEFAULT.FACT", EventKind::Create),
                ev(EntityType::Table, "DEFAULT.FACT", EventKind::Update),
            ]
        );
    }

    #[tokio::test]
    async fn data_model_create_and_update() {
        let fx = Fixture::new();
        let mut model = DataModelDesc::new("m", "DEFAULT.FACT");
        fx.catalog.create_data_model(&mut model).unwrap();
        assert_eq!(fx.announced(), 1);
        model.lookups.push("DEFAULT.DIM".into());
        fx.catalog.update_data_model(&mut model).unwrap();
        assert_eq!(fx.announced(), 2);
        assert!(fx.catalog.cache().data_model("m").unwrap().references("DEFAULT.DIM"));

        let mut again = DataModelDesc::new("m", "X.Y");
        assert!(matches!(
            fx.catalog.create_data_model(&mut again),
            Err(CatalogError::AlreadyExists { .. })
        ));
        assert_eq!(fx.announced(), 2);
    }

    #[tokio::test]
    async fn load_bypasses_cache() {
        let fx = Fixture::new();
        fx.catalog.create_project("p", "first").unwrap();
        let mut stored: ProjectInstance = fx.catalog.load("p").unwrap().unwrap();
        stored.description = "second".into();
        write_entity_cas(fx.store.as_ref(), "/project/p.json", &mut stored).unwrap();

        assert_eq!(fx.catalog.cache().project("p").unwrap().description, "first");
        let fresh: ProjectInstance = fx.catalog.load("p").unwrap().unwrap();
        assert_eq!(fresh.description, "second");
    }
}
