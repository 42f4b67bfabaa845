use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Tag identifying which cached subsystem a broadcast event concerns.
///
/// The wire form is the lower-case token returned by [`EntityType::token`].
/// Decoding accepts any letter case.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// Every cached subsystem at once (explicit resync).
    All,
    /// A cube instance: segments and status of one realization.
    Cube,
    /// A cube descriptor: the structural definition a cube is built from.
    CubeDesc,
    /// A project: an index of the realizations and tables it groups.
    Project,
    /// Source table metadata.
    Table,
    /// A data model: fact table plus lookups.
    DataModel,
}

impl EntityType {
    /// Every concrete entity type, excluding [`EntityType::All`].
    pub const CACHED: [EntityType; 5] = [
        EntityType::Cube,
        EntityType::CubeDesc,
        EntityType::Project,
        EntityType::Table,
        EntityType::DataModel,
    ];

    /// The wire token for this entity type.
    pub fn token(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Cube => "cube",
            Self::CubeDesc => "cube_desc",
            Self::Project => "project",
            Self::Table => "table",
            Self::DataModel => "data_model",
        }
    }

    /// Resource-store folder holding entities of this type.
    ///
    /// Returns `None` for [`EntityType::All`], which has no storage of its own.
    pub fn resource_root(&self) -> Option<&'static str> {
        match self {
            Self::All => None,
            Self::Cube => Some("/cube"),
            Self::CubeDesc => Some("/cube_desc"),
            Self::Project => Some("/project"),
            Self::Table => Some("/table"),
            Self::DataModel => Some("/model_desc"),
        }
    }

    /// Resource path of the named entity, e.g. `/cube/sales.json`.
    pub fn resource_path(&self, name: &str) -> Option<String> {
        self.resource_root().map(|root| format!("{root}/{name}.json"))
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for EntityType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "cube" => Ok(Self::Cube),
            "cube_desc" => Ok(Self::CubeDesc),
            "project" => Ok(Self::Project),
            "table" => Ok(Self::Table),
            "data_model" => Ok(Self::DataModel),
            _ => Err(TypeError::UnknownEntityType(s.to_string())),
        }
    }
}
