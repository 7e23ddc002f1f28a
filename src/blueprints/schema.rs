//! Blueprint schema types for TOML/JSON deserialization.
//!
//! A blueprint names the root part of a creature and says where its slots come
//! from: either an explicit list (schema version 1) or a structure template
//! plus an optional overlay of extra slots (schema version 2).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::{AnatomyError, Result, SlotCardinality};

/// Complete blueprint definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    /// Unique string identifier
    pub id: String,
    /// 1 = manual slots, 2 = structure template
    #[serde(default = "default_schema_version", alias = "schemaVersion")]
    pub schema_version: u32,
    /// Part type of the root part every slot ultimately hangs from
    pub root: String,
    /// Authored slots (version 1 only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slots: Option<Vec<SlotDef>>,
    /// Structure template id (version 2 only)
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "structureTemplateRef",
        alias = "structure_template_ref"
    )]
    pub structure_template: Option<String>,
    /// Slots layered over the template output (version 2 only)
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        alias = "additionalSlots"
    )]
    pub additional_slots: Vec<SlotDef>,
}

fn default_schema_version() -> u32 {
    1
}

/// Where a blueprint's slots come from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlueprintSource<'a> {
    /// Legacy authored slot list
    Manual { slots: &'a [SlotDef] },
    /// Template expansion plus overlay
    Templated {
        template: &'a str,
        additional_slots: &'a [SlotDef],
    },
}

impl Blueprint {
    /// Select the single generation path this blueprint's version allows.
    ///
    /// Fails when fields of both versions are populated or when the populated
    /// fields disagree with `schema_version`.
    pub fn source(&self) -> Result<BlueprintSource<'_>> {
        let has_manual = self.slots.is_some();
        let has_template = self.structure_template.is_some() || !self.additional_slots.is_empty();

        if has_manual && has_template {
            return Err(AnatomyError::MixedSchemaFields(self.id.clone()));
        }

        match self.schema_version {
            1 => {
                if has_template {
                    return Err(self.mismatch("declares template fields"));
                }
                Ok(BlueprintSource::Manual {
                    slots: self.slots.as_deref().unwrap_or(&[]),
                })
            }
            2 => {
                if has_manual {
                    return Err(self.mismatch("declares manual slots"));
                }
                let template = self
                    .structure_template
                    .as_deref()
                    .ok_or_else(|| self.mismatch("has no structure template reference"))?;
                Ok(BlueprintSource::Templated {
                    template,
                    additional_slots: &self.additional_slots,
                })
            }
            version => Err(AnatomyError::UnsupportedSchemaVersion {
                blueprint: self.id.clone(),
                version,
            }),
        }
    }

    fn mismatch(&self, detail: &str) -> AnatomyError {
        AnatomyError::SchemaVersionMismatch {
            blueprint: self.id.clone(),
            version: self.schema_version,
            detail: detail.to_string(),
        }
    }
}

/// An authored slot: a v1 slot or a v2 overlay slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDef {
    /// Slot id, unique within the blueprint
    pub id: String,
    /// Part type the occupant must have
    #[serde(alias = "partType")]
    pub part_type: String,
    /// Socket name on the owning part (defaults to the slot id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket: Option<String>,
    /// Parent slot whose part owns the socket (None = the root part)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
    /// Extra part types the socket accepts besides `part_type`
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "allowedTypes")]
    pub allowed_types: Vec<String>,
    /// Group tags for group patterns
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    /// Free-form properties for property filters
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl SlotDef {
    pub fn new(id: impl Into<String>, part_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            part_type: part_type.into(),
            socket: None,
            parent: None,
            optional: false,
            orientation: None,
            allowed_types: Vec::new(),
            groups: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    pub fn cardinality(&self) -> SlotCardinality {
        SlotCardinality::from_optional(self.optional)
    }
}

/// A concrete part the catalog knows about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartDefinition {
    pub id: String,
    #[serde(alias = "partType", alias = "subType")]
    pub part_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}
