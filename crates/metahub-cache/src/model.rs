use serde::{Deserialize, Serialize};

use metahub_store::VersionedEntity;
use metahub_types::{EntityType, Version};

use crate::entity::CachedEntity;

/// A data model: one fact table joined to lookup tables.
///
/// Table references use `DATABASE.TABLE` identities.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataModelDesc {
    pub name: String,
    pub fact_table: String,
    #[serde(default)]
    pub lookups: Vec<String>,
    #[serde(default)]
    pub last_modified: Version,
}

impl DataModelDesc {
    pub fn new(name: impl Into<String>, fact_table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fact_table: fact_table.into(),
            lookups: Vec::new(),
            last_modified: 0,
        }
    }

    /// Whether the model's fact or any lookup is `table` (case-insensitive).
    pub fn references(&self, table: &str) -> bool {
        self.fact_table.eq_ignore_ascii_case(table)
            || self.lookups.iter().any(|l| l.eq_ignore_ascii_case(table))
    }
}

impl VersionedEntity for DataModelDesc {
    fn last_modified(&self) -> Version {
        self.last_modified
    }

    fn set_last_modified(&mut self, version: Version) {
        self.last_modified = version;
    }
}

impl CachedEntity for DataModelDesc {
    const TYPE: EntityType = EntityType::DataModel;

    fn cache_key(&self) -> String {
        self.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_fact_and_lookups() {
        let mut model = DataModelDesc::new("m", "DEFAULT.FACT");
        model.lookups.push("DEFAULT.DIM_DATE".into());
        assert!(model.references("default.fact"));
        assert!(model.references("DEFAULT.DIM_DATE"));
        assert!(!model.references("DEFAULT.OTHER"));
        assert_eq!(model.resource_path(), "/model_desc/m.json");
    }
}
