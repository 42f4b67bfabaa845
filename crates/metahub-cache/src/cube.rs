use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use metahub_store::VersionedEntity;
use metahub_types::{EntityType, Version};

use crate::entity::CachedEntity;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CubeStatus {
    #[default]
    Disabled,
    Ready,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SegmentStatus {
    #[default]
    New,
    Ready,
}

/// One built slice of a cube.
///
/// `dictionaries` maps a column to the resource path of its dictionary,
/// `snapshots` maps a lookup table to the resource path of its snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CubeSegment {
    pub name: String,
    pub uuid: String,
    #[serde(default)]
    pub status: SegmentStatus,
    #[serde(default)]
    pub dictionaries: BTreeMap<String, String>,
    #[serde(default)]
    pub snapshots: BTreeMap<String, String>,
}

impl CubeSegment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uuid: Uuid::now_v7().to_string(),
            status: SegmentStatus::New,
            dictionaries: BTreeMap::new(),
            snapshots: BTreeMap::new(),
        }
    }
}

/// A cube instance: the realization of a cube descriptor and its segments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CubeInstance {
    pub name: String,
    pub desc_name: String,
    #[serde(default)]
    pub status: CubeStatus,
    #[serde(default)]
    pub segments: Vec<CubeSegment>,
    #[serde(default)]
    pub last_modified: Version,
}

impl CubeInstance {
    pub fn new(name: impl Into<String>, desc_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            desc_name: desc_name.into(),
            status: CubeStatus::Disabled,
            segments: Vec::new(),
            last_modified: 0,
        }
    }

    pub fn segment(&self, name: &str) -> Option<&CubeSegment> {
        self.segments.iter().find(|s| s.name == name)
    }

    pub fn segment_by_id(&self, uuid: &str) -> Option<&CubeSegment> {
        self.segments.iter().find(|s| s.uuid == uuid)
    }

    pub fn segment_by_id_mut(&mut self, uuid: &str) -> Option<&mut CubeSegment> {
        self.segments.iter_mut().find(|s| s.uuid == uuid)
    }

    /// Remove the segments with the given ids. Returns how many were removed.
    pub fn remove_segments(&mut self, uuids: &[String]) -> usize {
        let before = self.segments.len();
        self.segments.retain(|s| !uuids.contains(&s.uuid));
        before - self.segments.len()
    }
}

impl VersionedEntity for CubeInstance {
    fn last_modified(&self) -> Version {
        self.last_modified
    }

    fn set_last_modified(&mut self, version: Version) {
        self.last_modified = version;
    }
}

impl CachedEntity for CubeInstance {
    const TYPE: EntityType = EntityType::Cube;

    fn cache_key(&self) -> String {
        self.name.clone()
    }
}

/// Structural definition a cube is built from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CubeDesc {
    pub name: String,
    pub model_name: String,
    #[serde(default)]
    pub dimensions: Vec<String>,
    #[serde(default)]
    pub measures: Vec<String>,
    #[serde(default)]
    pub notify_list: Vec<String>,
    #[serde(default)]
    pub last_modified: Version,
}

impl CubeDesc {
    pub fn new(name: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model_name: model_name.into(),
            dimensions: Vec::new(),
            measures: Vec::new(),
            notify_list: Vec::new(),
            last_modified: 0,
        }
    }
}

impl VersionedEntity for CubeDesc {
    fn last_modified(&self) -> Version {
        self.last_modified
    }

    fn set_last_modified(&mut self, version: Version) {
        self.last_modified = version;
    }
}

impl CachedEntity for CubeDesc {
    const TYPE: EntityType = EntityType::CubeDesc;

    fn cache_key(&self) -> String {
        self.name.clone()
    }
}
