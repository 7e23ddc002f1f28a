//! Recipes: author-supplied part assignments.
//!
//! A binding targets either one slot by id or every slot a [`Pattern`]
//! resolves to, and names the part(s) to put there.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::SlotId;

/// Part assignments for one blueprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    /// Blueprint this recipe was written for, if it pins one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blueprint: Option<String>,
    #[serde(default)]
    pub bindings: Vec<Binding>,
    /// Body-level descriptors, attached to the graph root
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "bodyDescriptors"
    )]
    pub descriptors: Option<BodyDescriptors>,
}

/// A declarative rule resolving to a set of slot ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    /// All slots tagged with this group
    Group(String),
    /// Slot ids matching a `*` glob
    Wildcard(String),
    /// Slots satisfying every key/value pair
    #[serde(rename = "properties")]
    PropertyFilter(BTreeMap<String, String>),
}

impl Pattern {
    pub fn kind(&self) -> &'static str {
        match self {
            Pattern::Group(_) => "group",
            Pattern::Wildcard(_) => "wildcard",
            Pattern::PropertyFilter(_) => "properties",
        }
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pattern::Group(name) => write!(f, "group({})", name),
            Pattern::Wildcard(glob) => write!(f, "wildcard({})", glob),
            Pattern::PropertyFilter(filters) => {
                let pairs: Vec<String> = filters.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                write!(f, "properties({})", pairs.join(", "))
            }
        }
    }
}

/// What a binding points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingTarget {
    Slot(SlotId),
    Pattern(Pattern),
}

/// Reference to the part that should fill a slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRef {
    #[serde(alias = "partType")]
    pub part_type: String,
    /// Specific catalog definition to use
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "preferId",
        alias = "prefer_id"
    )]
    pub definition: Option<String>,
}

impl PartRef {
    pub fn of_type(part_type: impl Into<String>) -> Self {
        Self {
            part_type: part_type.into(),
            definition: None,
        }
    }
}

/// One recipe binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBinding", into = "RawBinding")]
pub struct Binding {
    pub target: BindingTarget,
    /// A single reference fills every match; several are handed out in order
    pub parts: Vec<PartRef>,
    /// Zero matches is a warning rather than an error
    pub optional: bool,
}

impl Binding {
    pub fn slot(slot: impl Into<SlotId>, part: PartRef) -> Self {
        Self {
            target: BindingTarget::Slot(slot.into()),
            parts: vec![part],
            optional: false,
        }
    }

    pub fn pattern(pattern: Pattern, parts: Vec<PartRef>) -> Self {
        Self {
            target: BindingTarget::Pattern(pattern),
            parts,
            optional: false,
        }
    }

    pub fn describe(&self) -> String {
        match &self.target {
            BindingTarget::Slot(slot) => format!("slot '{}'", slot),
            BindingTarget::Pattern(pattern) => pattern.to_string(),
        }
    }
}

/// Flat document shape of a binding
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawBinding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    slot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pattern: Option<Pattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    part: Option<PartRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    parts: Vec<PartRef>,
    #[serde(default)]
    optional: bool,
}

impl TryFrom<RawBinding> for Binding {
    type Error = String;

    fn try_from(raw: RawBinding) -> Result<Self, Self::Error> {
        let target = match (raw.slot, raw.pattern) {
            (Some(slot), None) => BindingTarget::Slot(slot),
            (None, Some(pattern)) => BindingTarget::Pattern(pattern),
            (Some(_), Some(_)) => return Err("binding has both 'slot' and 'pattern'".into()),
            (None, None) => return Err("binding needs a 'slot' or a 'pattern'".into()),
        };
        let mut parts = raw.parts;
        if let Some(part) = raw.part {
            parts.insert(0, part);
        }
        Ok(Binding {
            target,
            parts,
            optional: raw.optional,
        })
    }
}

impl From<Binding> for RawBinding {
    fn from(binding: Binding) -> Self {
        let (slot, pattern) = match binding.target {
            BindingTarget::Slot(slot) => (Some(slot), None),
            BindingTarget::Pattern(pattern) => (None, Some(pattern)),
        };
        RawBinding {
            slot,
            pattern,
            part: None,
            parts: binding.parts,
            optional: binding.optional,
        }
    }
}

/// Body build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Build {
    Skinny,
    Slim,
    Toned,
    Athletic,
    Shapely,
    Thick,
    Muscular,
    Stocky,
}

impl Build {
    pub const VALUES: &'static [&'static str] = &[
        "skinny", "slim", "toned", "athletic", "shapely", "thick", "muscular", "stocky",
    ];
}

/// Body hair density
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HairDensity {
    Hairless,
    Sparse,
    Moderate,
    Hairy,
    VeryHairy,
}

impl HairDensity {
    pub const VALUES: &'static [&'static str] =
        &["hairless", "sparse", "moderate", "hairy", "very-hairy"];
}

/// Body composition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Composition {
    Underweight,
    Lean,
    Average,
    Soft,
    Chubby,
    Overweight,
    Obese,
}

impl Composition {
    pub const VALUES: &'static [&'static str] = &[
        "underweight",
        "lean",
        "average",
        "soft",
        "chubby",
        "overweight",
        "obese",
    ];
}

/// Body-level attributes; each field is either present or absent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyDescriptors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<Build>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<HairDensity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composition: Option<Composition>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "skinColor"
    )]
    pub skin_color: Option<String>,
}

impl BodyDescriptors {
    pub fn is_empty(&self) -> bool {
        self.build.is_none()
            && self.density.is_none()
            && self.composition.is_none()
            && self.skin_color.as_deref().map_or(true, |c| c.trim().is_empty())
    }
}
