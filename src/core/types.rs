//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Identifier of a slot within one generated skeleton
pub type SlotId = String;

/// Index of a part within a generated graph's part arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartId(pub u32);

impl PartId {
    pub const ROOT: PartId = PartId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for PartId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "part#{}", self.0)
    }
}

/// Whether a slot must be filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotCardinality {
    #[default]
    Required,
    Optional,
}

impl SlotCardinality {
    pub fn from_optional(optional: bool) -> Self {
        if optional {
            SlotCardinality::Optional
        } else {
            SlotCardinality::Required
        }
    }

    pub fn socket(self) -> SocketCardinality {
        match self {
            SlotCardinality::Required => SocketCardinality::ExactlyOne,
            SlotCardinality::Optional => SocketCardinality::ZeroOrOne,
        }
    }
}

/// How many occupants a socket accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocketCardinality {
    ExactlyOne,
    ZeroOrOne,
}

/// Owner of a socket: the root part or the part filling a parent slot
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocketOwner {
    Root,
    Slot(SlotId),
}

impl SocketOwner {
    pub fn from_parent(parent: Option<&str>) -> Self {
        match parent {
            Some(slot) => SocketOwner::Slot(slot.to_string()),
            None => SocketOwner::Root,
        }
    }

    pub fn parent_slot(&self) -> Option<&str> {
        match self {
            SocketOwner::Root => None,
            SocketOwner::Slot(slot) => Some(slot),
        }
    }
}

impl std::fmt::Display for SocketOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SocketOwner::Root => f.write_str("root"),
            SocketOwner::Slot(slot) => write!(f, "slot '{}'", slot),
        }
    }
}
