//! Slot skeletons and generated part graphs.
//!
//! Both are flat arenas: ordered vectors plus id → index maps. A skeleton is
//! rebuilt wholesale for every generation, so nothing here holds references
//! into another structure.

use ahash::AHashMap;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::blueprints::BodyDescriptors;
use crate::core::{PartId, SlotCardinality, SlotId, SocketCardinality, SocketOwner};

/// Where a slot came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotSource {
    /// Authored in a version 1 blueprint
    Manual,
    /// Expanded from a template limb set or appendage
    Template { limb_set: String, index: u32 },
    /// Added by a version 2 overlay
    Additional,
}

/// A named attachment point requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub id: SlotId,
    pub part_type: String,
    /// Name of the socket this slot attaches to
    pub socket: String,
    /// Parent slot whose part owns the socket
    pub parent: Option<SlotId>,
    pub cardinality: SlotCardinality,
    pub orientation: Option<String>,
    pub groups: BTreeSet<String>,
    pub properties: BTreeMap<String, String>,
    pub source: SlotSource,
}

impl Slot {
    pub fn owner(&self) -> SocketOwner {
        SocketOwner::from_parent(self.parent.as_deref())
    }

    pub fn is_required(&self) -> bool {
        self.cardinality == SlotCardinality::Required
    }
}

/// A concrete attachment point on a part
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Socket {
    pub id: String,
    pub owner: SocketOwner,
    pub allowed_types: Vec<String>,
    pub cardinality: SocketCardinality,
    pub occupant: Option<PartId>,
}

impl Socket {
    pub fn accepts(&self, part_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t == part_type)
    }
}

/// Builder output: ordered slots with one socket per slot
#[derive(Debug, Clone, Default, Serialize)]
pub struct SlotSkeleton {
    pub blueprint_id: String,
    /// Part type of the root part
    pub root_type: String,
    slots: Vec<Slot>,
    sockets: Vec<Socket>,
    #[serde(skip)]
    index: AHashMap<SlotId, usize>,
    /// Group names that patterns may reference, populated or not
    declared_groups: BTreeSet<String>,
}

impl SlotSkeleton {
    pub fn new(blueprint_id: impl Into<String>, root_type: impl Into<String>) -> Self {
        Self {
            blueprint_id: blueprint_id.into(),
            root_type: root_type.into(),
            ..Default::default()
        }
    }

    /// Append a slot and its socket. Returns false if the id is taken.
    pub(crate) fn push(&mut self, slot: Slot, socket: Socket) -> bool {
        if self.index.contains_key(&slot.id) {
            return false;
        }
        for group in &slot.groups {
            self.declared_groups.insert(group.clone());
        }
        self.index.insert(slot.id.clone(), self.slots.len());
        self.slots.push(slot);
        self.sockets.push(socket);
        true
    }

    pub(crate) fn slot_mut(&mut self, id: &str) -> Option<(&mut Slot, &mut Socket)> {
        let idx = *self.index.get(id)?;
        Some((&mut self.slots[idx], &mut self.sockets[idx]))
    }

    pub(crate) fn declare_group(&mut self, name: impl Into<String>) {
        self.declared_groups.insert(name.into());
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn sockets(&self) -> &[Socket] {
        &self.sockets
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn slot(&self, id: &str) -> Option<&Slot> {
        self.index_of(id).map(|idx| &self.slots[idx])
    }

    pub fn socket_for(&self, id: &str) -> Option<&Socket> {
        self.index_of(id).map(|idx| &self.sockets[idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn slot_ids(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.id.as_str())
    }

    pub fn declared_groups(&self) -> &BTreeSet<String> {
        &self.declared_groups
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.declared_groups.contains(name)
    }

    /// Number of parent hops from a slot to the root
    pub fn depth(&self, id: &str) -> usize {
        let mut depth = 0;
        let mut current = self.slot(id).and_then(|s| s.parent.as_deref());
        while let Some(parent) = current {
            depth += 1;
            if depth > self.slots.len() {
                break;
            }
            current = self.slot(parent).and_then(|s| s.parent.as_deref());
        }
        depth
    }
}

impl PartialEq for SlotSkeleton {
    fn eq(&self, other: &Self) -> bool {
        self.blueprint_id == other.blueprint_id
            && self.root_type == other.root_type
            && self.slots == other.slots
            && self.sockets == other.sockets
            && self.declared_groups == other.declared_groups
    }
}

/// A generated part
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartNode {
    pub id: PartId,
    pub part_type: String,
    /// Catalog definition, when the recipe named one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    /// Slot this part fills (None for the root)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<SlotId>,
    /// Part owning the socket this part plugs into (None for the root)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<PartId>,
}

/// One row of the socket occupancy table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SocketAssignment {
    pub slot: SlotId,
    pub socket: String,
    /// Part owning the socket; None when the parent slot stayed empty
    pub owner: Option<PartId>,
    pub allowed_types: Vec<String>,
    pub cardinality: SocketCardinality,
    pub occupant: Option<PartId>,
    /// Left empty because a pattern matched more slots than it had parts
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub excess_match: bool,
}

impl SocketAssignment {
    pub fn is_filled(&self) -> bool {
        self.occupant.is_some()
    }
}

/// The finished anatomy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedGraph {
    pub blueprint_id: String,
    pub recipe_id: String,
    pub root: PartId,
    pub parts: Vec<PartNode>,
    pub sockets: Vec<SocketAssignment>,
    /// Body-level descriptors, held once at the root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptors: Option<BodyDescriptors>,
}

impl GeneratedGraph {
    pub fn part(&self, id: PartId) -> Option<&PartNode> {
        self.parts.get(id.index())
    }

    pub fn root_part(&self) -> Option<&PartNode> {
        self.part(self.root)
    }

    /// Part filling the given slot
    pub fn part_in_slot(&self, slot: &str) -> Option<&PartNode> {
        self.sockets
            .iter()
            .find(|s| s.slot == slot)
            .and_then(|s| s.occupant)
            .and_then(|id| self.part(id))
    }

    pub fn filled_slots(&self) -> impl Iterator<Item = &str> {
        self.sockets
            .iter()
            .filter(|s| s.is_filled())
            .map(|s| s.slot.as_str())
    }

    pub fn children_of(&self, id: PartId) -> impl Iterator<Item = &PartNode> {
        self.parts.iter().filter(move |p| p.parent == Some(id))
    }
}
