//! Structure templates: reusable limb-set declarations.
//!
//! A template says "eight legs named leg_{n}" once, and any number of
//! version 2 blueprints expand it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::SlotCardinality;

/// A reusable body plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureTemplate {
    pub id: String,
    /// Repeated structural units, expanded first
    #[serde(default, alias = "limbSets")]
    pub limb_sets: Vec<LimbSet>,
    /// Single or small-count attachments, expanded after limb sets
    #[serde(default)]
    pub appendages: Vec<LimbSet>,
    /// Named groups aliasing one or more limb sets
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<String>>,
}

impl StructureTemplate {
    /// Limb sets then appendages, in expansion order
    pub fn units(&self) -> impl Iterator<Item = &LimbSet> {
        self.limb_sets.iter().chain(self.appendages.iter())
    }

    /// Every group name a slot generated from this template can carry
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.units()
            .map(|unit| unit.name.as_str())
            .chain(self.groups.keys().map(String::as_str))
    }

    /// Extra groups that list the given limb set
    pub fn groups_containing<'a>(&'a self, limb_set: &'a str) -> impl Iterator<Item = &'a str> {
        self.groups
            .iter()
            .filter(move |(_, members)| members.iter().any(|m| m == limb_set))
            .map(|(name, _)| name.as_str())
    }
}

/// A limb set or appendage declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimbSet {
    /// Name, also the group tag of every slot it generates
    pub name: String,
    #[serde(default = "default_count")]
    pub count: i64,
    /// Naming pattern for generated slot ids, e.g. `leg_{n}`
    #[serde(alias = "socketPattern", alias = "pattern")]
    pub socket_pattern: String,
    #[serde(alias = "partType")]
    pub part_type: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub orientation: OrientationScheme,
    /// Slot whose part owns the generated sockets (None = the root part)
    #[serde(default)]
    pub parent: Option<String>,
    /// Value `{n}` takes for the first generated slot
    #[serde(default, alias = "startIndex")]
    pub start_index: u32,
    #[serde(default, alias = "allowedTypes")]
    pub allowed_types: Vec<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

fn default_count() -> i64 {
    1
}

impl LimbSet {
    pub fn cardinality(&self) -> SlotCardinality {
        SlotCardinality::from_optional(self.optional)
    }
}

/// How orientations are assigned to the slots of a limb set
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrientationScheme {
    /// No orientation
    #[default]
    Indexed,
    /// Alternating left / right
    Bilateral,
    /// One orientation per generated slot, in order
    Explicit(Vec<String>),
}

impl OrientationScheme {
    pub fn orientation_for(&self, index: usize) -> Option<String> {
        match self {
            OrientationScheme::Indexed => None,
            OrientationScheme::Bilateral => Some(
                if index % 2 == 0 { "left" } else { "right" }.to_string(),
            ),
            OrientationScheme::Explicit(list) => list.get(index).cloned(),
        }
    }
}
