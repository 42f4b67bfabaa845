use serde::{Deserialize, Serialize};

use metahub_store::VersionedEntity;
use metahub_types::{EntityType, Version};

use crate::entity::CachedEntity;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDesc {
    pub name: String,
    pub datatype: String,
}

/// Source table metadata, identified by `DATABASE.TABLE` in upper case.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDesc {
    pub database: String,
    pub name: String,
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub columns: Vec<ColumnDesc>,
    #[serde(default)]
    pub last_modified: Version,
}

impl TableDesc {
    pub fn new(database: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            database: database.into().to_ascii_uppercase(),
            name: name.into().to_ascii_uppercase(),
            uuid: uuid::Uuid::now_v7().to_string(),
            columns: Vec::new(),
            last_modified: 0,
        }
    }

    /// `DATABASE.TABLE`, upper case.
    pub fn identity(&self) -> String {
        format!("{}.{}", self.database, self.name).to_ascii_uppercase()
    }
}

impl VersionedEntity for TableDesc {
    fn last_modified(&self) -> Version {
        self.last_modified
    }

    fn set_last_modified(&mut self, version: Version) {
        self.last_modified = version;
    }
}

impl CachedEntity for TableDesc {
    const TYPE: EntityType = EntityType::Table;

    fn cache_key(&self) -> String {
        self.identity()
    }

    fn normalize_key(name: &str) -> String {
        name.to_ascii_uppercase()
    }
}
