use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use serde::Serialize;
use tracing::{debug, error, info};

use metahub_store::{path, read_entity, ResourceStore};
use metahub_types::{BroadcastEvent, EntityType, EventKind};

use crate::cache::EntityCache;
use crate::cube::{CubeDesc, CubeInstance};
use crate::entity::CachedEntity;
use crate::error::{CacheError, CacheResult};
use crate::model::DataModelDesc;
use crate::project::ProjectInstance;
use crate::table::TableDesc;

/// What handling an event did to the local cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HandleOutcome {
    /// The entry was reloaded from the store.
    Rebuilt,
    /// The entry is absent: evicted, or gone from the store at rebuild time.
    Removed,
}

/// The receiver-side consumer of decoded broadcast events.
///
/// Implementations must be idempotent and tolerate out-of-order delivery.
pub trait BroadcastHandler: Send + Sync {
    fn handle(&self, event: &BroadcastEvent) -> CacheResult<HandleOutcome>;
}

/// Cached entry counts per entity type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub cubes: usize,
    pub cube_descs: usize,
    pub projects: usize,
    pub tables: usize,
    pub data_models: usize,
}

/// Node-local caches of every metadata entity type.
///
/// Entries are derived state: every rebuild re-reads the resource store in
/// full and no event payload is ever applied directly. Concurrent events for
/// the same key therefore converge on whatever the store holds last.
pub struct CacheService {
    store: Arc<dyn ResourceStore>,
    cubes: EntityCache<CubeInstance>,
    cube_descs: EntityCache<CubeDesc>,
    projects: EntityCache<ProjectInstance>,
    tables: EntityCache<TableDesc>,
    models: EntityCache<DataModelDesc>,
    /// cube name -> names of cached projects realizing it
    cube_projects: RwLock<HashMap<String, BTreeSet<String>>>,
}

impl CacheService {
    /// Create an empty cache over `store`. Call [`CacheService::resync_all`]
    /// to warm it.
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self {
            store,
            cubes: EntityCache::new(),
            cube_descs: EntityCache::new(),
            projects: EntityCache::new(),
            tables: EntityCache::new(),
            models: EntityCache::new(),
            cube_projects: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn ResourceStore> {
        &self.store
    }

    /// Dispatch one event: create and update rebuild, drop removes.
    pub fn dispatch(&self, entity_type: EntityType, name: &str, kind: EventKind) -> CacheResult<HandleOutcome> {
        match kind {
            EventKind::Create | EventKind::Update => self.rebuild(entity_type, name),
            EventKind::Drop => Ok(self.remove(entity_type, name)),
        }
    }

    /// Discard the cached entry and reload it from the store, then run
    /// dependent rebuilds.
    ///
    /// On a store failure the entry is left absent and the error returned.
    pub fn rebuild(&self, entity_type: EntityType, name: &str) -> CacheResult<HandleOutcome> {
        let outcome = match entity_type {
            EntityType::All => {
                self.resync_all()?;
                return Ok(HandleOutcome::Rebuilt);
            }
            EntityType::Cube => {
                let loaded = self.reload(&self.cubes, name);
                self.cascade_cube(name);
                outcome(loaded?)
            }
            EntityType::CubeDesc => outcome(self.reload(&self.cube_descs, name)?),
            EntityType::Project => {
                let loaded = self.reload(&self.projects, name);
                self.index_project(name, loaded.as_ref().ok().and_then(Option::as_deref));
                outcome(loaded?)
            }
            EntityType::Table => {
                let loaded = self.reload(&self.tables, name);
                self.cascade_table(&TableDesc::normalize_key(name));
                outcome(loaded?)
            }
            EntityType::DataModel => outcome(self.reload(&self.models, name)?),
        };
        debug!(%entity_type, name, ?outcome, "cache entry rebuilt");
        Ok(outcome)
    }

    /// Evict the cached entry, then run dependent rebuilds. Idempotent.
    pub fn remove(&self, entity_type: EntityType, name: &str) -> HandleOutcome {
        match entity_type {
            EntityType::All => self.clear_all(),
            EntityType::Cube => {
                self.cubes.remove(name);
                self.cascade_cube(name);
            }
            EntityType::CubeDesc => {
                self.cube_descs.remove(name);
            }
            EntityType::Project => {
                self.projects.remove(name);
                self.index_project(name, None);
            }
            EntityType::Table => {
                let key = TableDesc::normalize_key(name);
                self.tables.remove(&key);
                self.cascade_table(&key);
            }
            EntityType::DataModel => {
                self.models.remove(name);
            }
        }
        debug!(%entity_type, name, "cache entry removed");
        HandleOutcome::Removed
    }

    /// Drop every cached entry and reload all entity types from the store.
    ///
    /// Individual entities that fail to load are logged and skipped. Returns
    /// the number of entries loaded.
    pub fn resync_all(&self) -> CacheResult<usize> {
        self.clear_all();
        let mut loaded = 0;
        loaded += self.load_all(&self.tables)?;
        loaded += self.load_all(&self.models)?;
        loaded += self.load_all(&self.cube_descs)?;
        loaded += self.load_all(&self.cubes)?;
        loaded += self.load_all(&self.projects)?;
        for project in self.projects.values() {
            self.index_project(&project.name, Some(project.as_ref()));
        }
        info!(loaded, "metadata cache resynced");
        Ok(loaded)
    }

    /// Drop every cached entry without reloading.
    pub fn clear_all(&self) {
        self.cubes.clear();
        self.cube_descs.clear();
        self.projects.clear();
        self.tables.clear();
        self.models.clear();
        self.cube_projects
            .write()
            .expect("realization index lock poisoned")
            .clear();
    }

    pub fn cube(&self, name: &str) -> Option<Arc<CubeInstance>> {
        self.cubes.get(name)
    }

    pub fn cube_desc(&self, name: &str) -> Option<Arc<CubeDesc>> {
        self.cube_descs.get(name)
    }

    pub fn project(&self, name: &str) -> Option<Arc<ProjectInstance>> {
        self.projects.get(name)
    }

    /// Look up a table by `DATABASE.TABLE`, any letter case.
    pub fn table(&self, identity: &str) -> Option<Arc<TableDesc>> {
        self.tables.get(&TableDesc::normalize_key(identity))
    }

    pub fn data_model(&self, name: &str) -> Option<Arc<DataModelDesc>> {
        self.models.get(name)
    }

    pub fn cubes(&self) -> Vec<Arc<CubeInstance>> {
        self.cubes.values()
    }

    pub fn projects(&self) -> Vec<Arc<ProjectInstance>> {
        self.projects.values()
    }

    /// Names of cached projects that realize `cube`, sorted.
    pub fn projects_of_cube(&self, cube: &str) -> Vec<String> {
        self.cube_projects
            .read()
            .expect("realization index lock poisoned")
            .get(cube)
            .map(|projects| projects.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            cubes: self.cubes.len(),
            cube_descs: self.cube_descs.len(),
            projects: self.projects.len(),
            tables: self.tables.len(),
            data_models: self.models.len(),
        }
    }

    fn reload<T: CachedEntity>(&self, cache: &EntityCache<T>, name: &str) -> CacheResult<Option<Arc<T>>> {
        let key = T::normalize_key(name);
        let path = T::path_of(&key);
        let loaded = match read_entity::<T, _>(self.store.as_ref(), &path) {
            Ok(loaded) => loaded,
            Err(e) => {
                cache.remove(&key);
                return Err(e.into());
            }
        };
        let Some(entity) = loaded else {
            cache.remove(&key);
            return Ok(None);
        };
        let found = entity.cache_key();
        if found != key {
            cache.remove(&key);
            return Err(CacheError::NameMismatch {
                entity_type: T::TYPE,
                path,
                expected: key,
                found,
            });
        }
        let entity = Arc::new(entity);
        cache.insert(key, Arc::clone(&entity));
        Ok(Some(entity))
    }

    fn load_all<T: CachedEntity>(&self, cache: &EntityCache<T>) -> CacheResult<usize> {
        let Some(root) = T::TYPE.resource_root() else {
            return Ok(0);
        };
        let mut loaded = 0;
        for resource in self.store.list_recursive(root)? {
            let Some(name) = path::file_name(&resource).strip_suffix(".json") else {
                continue;
            };
            match self.reload(cache, name) {
                Ok(Some(_)) => loaded += 1,
                Ok(None) => {}
                Err(e) => {
                    error!(entity_type = %T::TYPE, name, error = %e, "failed to load cached entity")
                }
            }
        }
        Ok(loaded)
    }

    /// Replace the realization index entries of one project.
    fn index_project(&self, name: &str, project: Option<&ProjectInstance>) {
        let mut index = self
            .cube_projects
            .write()
            .expect("realization index lock poisoned");
        for projects in index.values_mut() {
            projects.remove(name);
        }
        index.retain(|_, projects| !projects.is_empty());
        if let Some(project) = project {
            for cube in project.cubes() {
                index
                    .entry(cube.to_string())
                    .or_default()
                    .insert(name.to_string());
            }
        }
    }

    fn cascade_cube(&self, cube: &str) {
        for project in self.projects_of_cube(cube) {
            debug!(cube, project = %project, "cascading cube change to project");
            let loaded = self.reload(&self.projects, &project);
            self.index_project(&project, loaded.as_ref().ok().and_then(Option::as_deref));
            if let Err(e) = loaded {
                error!(cube, project = %project, error = %e, "dependent project rebuild failed");
            }
        }
    }

    fn cascade_table(&self, identity: &str) {
        for model in self.models.values() {
            if !model.references(identity) {
                continue;
            }
            debug!(table = identity, model = %model.name, "cascading table change to data model");
            if let Err(e) = self.reload(&self.models, &model.name) {
                error!(table = identity, model = %model.name, error = %e, "dependent data model rebuild failed");
            }
        }
    }
}

impl BroadcastHandler for CacheService {
    fn handle(&self, event: &BroadcastEvent) -> CacheResult<HandleOutcome> {
        self.dispatch(event.entity_type, &event.entity_name, event.kind)
    }
}

impl std::fmt::Debug for CacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheService")
            .field("stats", &self.stats())
            .finish()
    }
}

fn outcome<T>(loaded: Option<T>) -> HandleOutcome {
    if loaded.is_some() {
        HandleOutcome::Rebuilt
    } else {
        HandleOutcome::Removed
    }
}
