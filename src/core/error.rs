use thiserror::Error;

use crate::validation::{Stage, ValidationReport};

/// Broad family an error belongs to.
///
/// Reference errors point at something that does not exist, structure errors
/// at a definition that is malformed, integrity errors at a generated graph
/// that breaks an invariant. Document errors come from reading files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorClass {
    Reference,
    Structure,
    Integrity,
    Document,
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorClass::Reference => "reference",
            ErrorClass::Structure => "structure",
            ErrorClass::Integrity => "integrity",
            ErrorClass::Document => "document",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum AnatomyError {
    // === REFERENCE ===
    #[error("Blueprint '{blueprint}' references structure template '{template}' which is not loaded")]
    TemplateNotFound { blueprint: String, template: String },

    #[error("Blueprint not found: {0}")]
    BlueprintNotFound(String),

    #[error("Recipe not found: {0}")]
    RecipeNotFound(String),

    #[error("Unknown part type '{part_type}' referenced by {referrer}")]
    UnknownPartType { part_type: String, referrer: String },

    #[error("Unknown part definition '{definition}' referenced by {referrer}")]
    UnknownPartDefinition { definition: String, referrer: String },

    #[error("Unknown group '{0}'")]
    UnknownGroup(String),

    #[error("Slot '{slot}' attaches to unknown parent slot '{parent}'")]
    UnknownParentSlot { slot: String, parent: String },

    #[error("Slot '{0}' does not exist in the generated skeleton")]
    UnknownSlot(String),

    // === STRUCTURE ===
    #[error("Blueprint '{0}' declares both manual slots and a structure template")]
    MixedSchemaFields(String),

    #[error("Blueprint '{blueprint}' declares schema version {version}, which is not supported")]
    UnsupportedSchemaVersion { blueprint: String, version: u32 },

    #[error("Blueprint '{blueprint}' is schema version {version} but {detail}")]
    SchemaVersionMismatch {
        blueprint: String,
        version: u32,
        detail: String,
    },

    #[error("Slot '{0}' has an empty part type")]
    MissingPartType(String),

    #[error("Slot id '{0}' is declared more than once")]
    DuplicateSlotId(String),

    #[error("Socket '{socket}' on {owner} is claimed by more than one slot")]
    DuplicateSocket { socket: String, owner: String },

    #[error("Slots form a parent cycle through '{0}'")]
    SlotCycle(String),

    #[error("Limb set '{limb_set}' has invalid count {count} (expected 1..={max})")]
    InvalidLimbCount { limb_set: String, count: i64, max: u32 },

    #[error("Limb set '{limb_set}' has invalid naming pattern '{pattern}': {reason}")]
    InvalidNamingPattern {
        limb_set: String,
        pattern: String,
        reason: String,
    },

    #[error("Limb set '{limb_set}' lists {given} orientations for a count of {count}")]
    OrientationCountMismatch {
        limb_set: String,
        given: usize,
        count: i64,
    },

    #[error("Additional slot '{slot}' conflicts with the generated slot: {detail}")]
    SlotShapeConflict { slot: String, detail: String },

    #[error("Wildcard pattern '{0}' contains no '*'; bind the slot by id instead")]
    DegenerateWildcard(String),

    #[error("Unrecognized property filter key '{0}'")]
    UnknownFilterKey(String),

    #[error("Property filter declares no keys")]
    EmptyPropertyFilter,

    #[error("Binding {binding} supplies no part references")]
    EmptyBinding { binding: usize },

    #[error("Part type '{part_type}' cannot occupy slot '{slot}' (allowed: {allowed:?})")]
    IncompatiblePart {
        slot: String,
        part_type: String,
        allowed: Vec<String>,
    },

    // === INTEGRITY ===
    #[error("Slot '{slot}' is bound but its parent slot '{parent}' was left empty")]
    DetachedSlot { slot: String, parent: String },

    #[error("{stage} validation failed with {} error(s)", report.errors.len())]
    ValidationFailed {
        stage: Stage,
        report: Box<ValidationReport>,
    },

    // === DOCUMENT ===
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl AnatomyError {
    pub fn class(&self) -> ErrorClass {
        use AnatomyError::*;
        match self {
            TemplateNotFound { .. }
            | BlueprintNotFound(_)
            | RecipeNotFound(_)
            | UnknownPartType { .. }
            | UnknownPartDefinition { .. }
            | UnknownGroup(_)
            | UnknownParentSlot { .. }
            | UnknownSlot(_) => ErrorClass::Reference,

            MixedSchemaFields(_)
            | UnsupportedSchemaVersion { .. }
            | SchemaVersionMismatch { .. }
            | MissingPartType(_)
            | DuplicateSlotId(_)
            | DuplicateSocket { .. }
            | SlotCycle(_)
            | InvalidLimbCount { .. }
            | InvalidNamingPattern { .. }
            | OrientationCountMismatch { .. }
            | SlotShapeConflict { .. }
            | DegenerateWildcard(_)
            | UnknownFilterKey(_)
            | EmptyPropertyFilter
            | EmptyBinding { .. }
            | IncompatiblePart { .. } => ErrorClass::Structure,

            DetachedSlot { .. } => ErrorClass::Integrity,
            ValidationFailed { stage, report } => match report.errors.first() {
                Some(finding) => finding.class,
                None if *stage == Stage::Integrity => ErrorClass::Integrity,
                None => ErrorClass::Structure,
            },

            IoError(_) | SerdeError(_) | TomlError(_) => ErrorClass::Document,
        }
    }

    /// The validation report carried by a failed stage, if any
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            AnatomyError::ValidationFailed { report, .. } => Some(report.as_ref()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnatomyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        let err = AnatomyError::TemplateNotFound {
            blueprint: "spider".into(),
            template: "arachnid".into(),
        };
        assert_eq!(err.class(), ErrorClass::Reference);
        assert!(err.to_string().contains("arachnid"));

        assert_eq!(
            AnatomyError::DegenerateWildcard("leg_1".into()).class(),
            ErrorClass::Structure
        );
        assert_eq!(
            AnatomyError::DetachedSlot {
                slot: "claw".into(),
                parent: "arm".into()
            }
            .class(),
            ErrorClass::Integrity
        );
    }

    #[test]
    fn test_validation_failed_display() {
        let mut report = ValidationReport::new(Stage::Integrity);
        report.error(ErrorClass::Integrity, "graph", "socket empty");
        let err = AnatomyError::ValidationFailed {
            stage: Stage::Integrity,
            report: Box::new(report),
        };
        assert_eq!(err.class(), ErrorClass::Integrity);
        assert!(err.to_string().contains("1 error"));
        assert!(err.report().is_some());
    }
}
