use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entity::EntityType;
use crate::error::TypeError;

/// Kind of change a broadcast event reports.
///
/// This is a closed set. Every dispatch site matches it exhaustively, so a
/// new variant forces each of them to be revisited.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Create,
    Update,
    Drop,
}

impl EventKind {
    /// The wire token for this event kind.
    pub fn token(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Drop => "drop",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for EventKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "drop" => Ok(Self::Drop),
            _ => Err(TypeError::UnknownEventKind(s.to_string())),
        }
    }
}

/// A change notification announced to cluster peers.
///
/// Produced only after the triggering mutation has committed to the resource
/// store. Carries the identity and kind of the change, never its content:
/// receivers always re-read the store.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BroadcastEvent {
    pub entity_type: EntityType,
    pub entity_name: String,
    pub kind: EventKind,
}

impl BroadcastEvent {
    pub fn new(entity_type: EntityType, entity_name: impl Into<String>, kind: EventKind) -> Self {
        Self {
            entity_type,
            entity_name: entity_name.into(),
            kind,
        }
    }

    /// Decode an event from its three textual wire fields.
    pub fn decode(entity_type: &str, entity_name: &str, kind: &str) -> Result<Self, TypeError> {
        Ok(Self {
            entity_type: entity_type.parse()?,
            entity_name: entity_name.to_string(),
            kind: kind.parse()?,
        })
    }
}

impl fmt::Display for BroadcastEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.entity_type, self.entity_name, self.kind)
    }
}
