use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use metahub_store::VersionedEntity;
use metahub_types::{EntityType, Version};

use crate::entity::CachedEntity;

/// A realization a project groups, such as a cube.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RealizationEntry {
    pub entity_type: EntityType,
    pub name: String,
}

impl RealizationEntry {
    pub fn cube(name: impl Into<String>) -> Self {
        Self {
            entity_type: EntityType::Cube,
            name: name.into(),
        }
    }
}

/// A project: an index over the realizations, tables and models it groups.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInstance {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub realizations: BTreeSet<RealizationEntry>,
    #[serde(default)]
    pub tables: BTreeSet<String>,
    #[serde(default)]
    pub models: BTreeSet<String>,
    #[serde(default)]
    pub last_modified: Version,
}

impl ProjectInstance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            realizations: BTreeSet::new(),
            tables: BTreeSet::new(),
            models: BTreeSet::new(),
            last_modified: 0,
        }
    }

    pub fn contains_cube(&self, cube: &str) -> bool {
        self.realizations
            .iter()
            .any(|r| r.entity_type == EntityType::Cube && r.name == cube)
    }

    /// Names of the cubes this project groups.
    pub fn cubes(&self) -> impl Iterator<Item = &str> {
        self.realizations
            .iter()
            .filter(|r| r.entity_type == EntityType::Cube)
            .map(|r| r.name.as_str())
    }
}

impl VersionedEntity for ProjectInstance {
    fn last_modified(&self) -> Version {
        self.last_modified
    }

    fn set_last_modified(&mut self, version: Version) {
        self.last_modified = version;
    }
}

impl CachedEntity for ProjectInstance {
    const TYPE: EntityType = EntityType::Project;

    fn cache_key(&self) -> String {
        self.name.clone()
    }
}
