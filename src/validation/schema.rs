//! Stage A: raw document checks.
//!
//! Runs on `serde_json::Value` before typed deserialization so one pass can
//! report every missing field and bad value in a document at once. TOML
//! documents are converted to JSON values by the loader first.

use serde_json::{Map, Value};

use super::{Stage, ValidationReport};
use crate::anatomy::NamingPattern;
use crate::blueprints::{Build, Composition, HairDensity};
use crate::core::{config, AnatomyConfig, ErrorClass};

/// Kind of document being checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Blueprint,
    Template,
    Recipe,
    Part,
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DocumentKind::Blueprint => "blueprint",
            DocumentKind::Template => "template",
            DocumentKind::Recipe => "recipe",
            DocumentKind::Part => "part",
        };
        f.write_str(name)
    }
}

const TEMPLATE_REF_KEYS: &[&str] = &[
    "structure_template",
    "structureTemplateRef",
    "structure_template_ref",
];
const ADDITIONAL_SLOT_KEYS: &[&str] = &["additional_slots", "additionalSlots"];
const PART_TYPE_KEYS: &[&str] = &["part_type", "partType"];
const PATTERN_KINDS: &[&str] = &["group", "wildcard", "properties"];

/// First present key among a field's accepted spellings
fn field<'v>(obj: &'v Map<String, Value>, names: &[&str]) -> Option<&'v Value> {
    names.iter().find_map(|name| obj.get(*name))
}

pub struct SchemaValidator<'a> {
    config: &'a AnatomyConfig,
}

impl Default for SchemaValidator<'static> {
    fn default() -> Self {
        Self::new(config())
    }
}

impl<'a> SchemaValidator<'a> {
    pub fn new(config: &'a AnatomyConfig) -> Self {
        Self { config }
    }

    /// Check one raw document. `subject` names it in findings (usually a path).
    pub fn validate(&self, kind: DocumentKind, doc: &Value, subject: &str) -> ValidationReport {
        let mut report = ValidationReport::new(Stage::Schema);
        let Some(obj) = doc.as_object() else {
            report.error(
                ErrorClass::Structure,
                subject,
                &format!("{} document must be a table/object", kind),
            );
            return report;
        };

        require_string(obj, &["id"], subject, &mut report);
        match kind {
            DocumentKind::Blueprint => self.check_blueprint(obj, subject, &mut report),
            DocumentKind::Template => self.check_template(obj, subject, &mut report),
            DocumentKind::Recipe => self.check_recipe(obj, subject, &mut report),
            DocumentKind::Part => {
                require_string(obj, &["part_type", "partType", "subType"], subject, &mut report);
            }
        }

        if !report.is_valid() {
            tracing::debug!(subject, kind = %kind, errors = report.errors.len(), "schema check failed");
        }
        report
    }

    fn check_blueprint(&self, obj: &Map<String, Value>, subject: &str, report: &mut ValidationReport) {
        require_string(obj, &["root"], subject, report);

        let version = match field(obj, &["schema_version", "schemaVersion"]) {
            None => Some(1),
            Some(value) => match value.as_u64() {
                Some(v @ (1 | 2)) => Some(v),
                _ => {
                    report.error(
                        ErrorClass::Structure,
                        subject,
                        &format!("schema_version must be 1 or 2, found {}", value),
                    );
                    None
                }
            },
        };

        let slots = obj.get("slots");
        let template_ref = field(obj, TEMPLATE_REF_KEYS);
        let additional = field(obj, ADDITIONAL_SLOT_KEYS);

        if slots.is_some() && (template_ref.is_some() || additional.is_some()) {
            report.error(
                ErrorClass::Structure,
                subject,
                "declares both manual slots and structure template fields",
            );
        }
        match version {
            Some(1) if template_ref.is_some() || additional.is_some() => report.error(
                ErrorClass::Structure,
                subject,
                "schema version 1 does not take structure template fields",
            ),
            Some(2) if slots.is_some() => report.error(
                ErrorClass::Structure,
                subject,
                "schema version 2 does not take manual slots",
            ),
            Some(2) => match template_ref {
                Some(Value::String(name)) if !name.trim().is_empty() => {}
                Some(_) => report.error(
                    ErrorClass::Structure,
                    subject,
                    "structure template reference must be a non-empty string",
                ),
                None => report.error(
                    ErrorClass::Structure,
                    subject,
                    "schema version 2 requires a structure template reference",
                ),
            },
            _ => {}
        }

        for (key, value) in [("slots", slots), ("additional_slots", additional)] {
            let Some(value) = value else { continue };
            let Some(list) = value.as_array() else {
                report.error(ErrorClass::Structure, subject, &format!("'{}' must be an array", key));
                continue;
            };
            for (i, slot) in list.iter().enumerate() {
                let slot_subject = format!("{} {}[{}]", subject, key, i);
                match slot.as_object() {
                    Some(slot) => {
                        require_string(slot, &["id"], &slot_subject, report);
                        require_string(slot, PART_TYPE_KEYS, &slot_subject, report);
                    }
                    None => report.error(ErrorClass::Structure, &slot_subject, "slot must be a table/object"),
                }
            }
        }
    }

    fn check_template(&self, obj: &Map<String, Value>, subject: &str, report: &mut ValidationReport) {
        let mut names = Vec::new();
        for key in ["limb_sets", "appendages"] {
            let value = if key == "limb_sets" {
                field(obj, &["limb_sets", "limbSets"])
            } else {
                obj.get(key)
            };
            let Some(value) = value else { continue };
            let Some(units) = value.as_array() else {
                report.error(ErrorClass::Structure, subject, &format!("'{}' must be an array", key));
                continue;
            };
            for (i, unit) in units.iter().enumerate() {
                let unit_subject = format!("{} {}[{}]", subject, key, i);
                let Some(unit) = unit.as_object() else {
                    report.error(ErrorClass::Structure, &unit_subject, "limb set must be a table/object");
                    continue;
                };
                if let Some(name) = require_string(unit, &["name"], &unit_subject, report) {
                    names.push(name.to_string());
                }
                require_string(unit, PART_TYPE_KEYS, &unit_subject, report);
                self.check_limb_set(unit, &unit_subject, report);
            }
        }

        if let Some(groups) = obj.get("groups") {
            let Some(groups) = groups.as_object() else {
                report.error(ErrorClass::Structure, subject, "'groups' must be a table/object");
                return;
            };
            for (group, members) in groups {
                let Some(members) = members.as_array() else {
                    report.error(
                        ErrorClass::Structure,
                        subject,
                        &format!("group '{}' must list limb set names", group),
                    );
                    continue;
                };
                for member in members {
                    match member.as_str() {
                        Some(name) if names.iter().any(|n| n == name) => {}
                        Some(name) => report.error(
                            ErrorClass::Reference,
                            subject,
                            &format!("group '{}' lists unknown limb set '{}'", group, name),
                        ),
                        None => report.error(
                            ErrorClass::Structure,
                            subject,
                            &format!("group '{}' members must be strings", group),
                        ),
                    }
                }
            }
        }
    }

    fn check_limb_set(&self, unit: &Map<String, Value>, subject: &str, report: &mut ValidationReport) {
        let count = match unit.get("count") {
            None => Some(1),
            Some(value) => match value.as_i64() {
                Some(n) if n >= 1 && n <= i64::from(self.config.max_limb_count) => Some(n),
                Some(n) => {
                    report.error(
                        ErrorClass::Structure,
                        subject,
                        &format!("count {} is outside 1..={}", n, self.config.max_limb_count),
                    );
                    None
                }
                None => {
                    report.error(ErrorClass::Structure, subject, "count must be an integer");
                    None
                }
            },
        };

        if let Some(pattern) =
            require_string(unit, &["socket_pattern", "socketPattern", "pattern"], subject, report)
        {
            match NamingPattern::parse(pattern) {
                Ok(parsed) => {
                    if count.is_some_and(|n| n > 1) && !parsed.uses_index() && !parsed.uses_orientation() {
                        report.error(
                            ErrorClass::Structure,
                            subject,
                            &format!("pattern '{}' has no placeholder but count is above 1", pattern),
                        );
                    }
                }
                Err(reason) => report.error(
                    ErrorClass::Structure,
                    subject,
                    &format!("invalid naming pattern '{}': {}", pattern, reason),
                ),
            }
        }

        if let Some(value) = field(unit, &["start_index", "startIndex"]) {
            match value.as_u64().filter(|n| *n <= u64::from(u32::MAX)) {
                Some(start) => {
                    let last = start + count.map_or(0, |n| n as u64 - 1);
                    if last > u64::from(u32::MAX) {
                        report.error(
                            ErrorClass::Structure,
                            subject,
                            &format!("start_index {} overflows the slot index range", start),
                        );
                    }
                }
                None => report.error(
                    ErrorClass::Structure,
                    subject,
                    &format!("start_index must be an integer in 0..={}, found {}", u32::MAX, value),
                ),
            }
        }

        match unit.get("parent") {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) if !s.trim().is_empty() => {}
            Some(other) => report.error(
                ErrorClass::Structure,
                subject,
                &format!("parent must be a non-empty slot id, found {}", other),
            ),
        }

        match unit.get("orientation") {
            None => {}
            Some(Value::String(s)) if s == "indexed" || s == "bilateral" => {}
            Some(Value::Object(explicit)) => match explicit.get("explicit").and_then(Value::as_array) {
                Some(list) if explicit.len() == 1 => {
                    if let Some(n) = count {
                        if list.len() as i64 != n {
                            report.error(
                                ErrorClass::Structure,
                                subject,
                                &format!("lists {} orientations for a count of {}", list.len(), n),
                            );
                        }
                    }
                }
                _ => report.error(
                    ErrorClass::Structure,
                    subject,
                    "orientation table must be { explicit = [...] }",
                ),
            },
            Some(other) => report.error(
                ErrorClass::Structure,
                subject,
                &format!("unknown orientation scheme {}", other),
            ),
        }
    }

    fn check_recipe(&self, obj: &Map<String, Value>, subject: &str, report: &mut ValidationReport) {
        if let Some(bindings) = obj.get("bindings") {
            match bindings.as_array() {
                Some(bindings) => {
                    for (i, binding) in bindings.iter().enumerate() {
                        check_binding(binding, &format!("{} bindings[{}]", subject, i), report);
                    }
                }
                None => report.error(ErrorClass::Structure, subject, "'bindings' must be an array"),
            }
        }

        if let Some(descriptors) = field(obj, &["descriptors", "bodyDescriptors"]) {
            self.check_descriptors(descriptors, subject, report);
        }
    }

    fn check_descriptors(&self, value: &Value, subject: &str, report: &mut ValidationReport) {
        let Some(obj) = value.as_object() else {
            report.error(ErrorClass::Structure, subject, "descriptors must be a table/object");
            return;
        };
        let vocabularies: [(&str, &[&str]); 3] = [
            ("build", Build::VALUES),
            ("density", HairDensity::VALUES),
            ("composition", Composition::VALUES),
        ];
        for (key, allowed) in vocabularies {
            let Some(value) = obj.get(key) else { continue };
            let known = value.as_str().is_some_and(|v| allowed.contains(&v));
            if !known {
                let message = format!(
                    "descriptor '{}' has unknown value {} (expected one of: {})",
                    key,
                    value,
                    allowed.join(", ")
                );
                if self.config.descriptor_strict {
                    report.error(ErrorClass::Structure, subject, &message);
                } else {
                    report.warn(ErrorClass::Structure, subject, &message);
                }
            }
        }
        if let Some(color) = field(obj, &["skin_color", "skinColor"]) {
            if !color.is_string() {
                report.error(ErrorClass::Structure, subject, "skin_color must be a string");
            }
        }
        for key in obj.keys() {
            let known = matches!(
                key.as_str(),
                "build" | "density" | "composition" | "skin_color" | "skinColor"
            );
            if !known {
                report.warn(
                    ErrorClass::Structure,
                    subject,
                    &format!("unknown descriptor '{}' ignored", key),
                );
            }
        }
    }
}

fn check_binding(binding: &Value, subject: &str, report: &mut ValidationReport) {
    let Some(obj) = binding.as_object() else {
        report.error(ErrorClass::Structure, subject, "binding must be a table/object");
        return;
    };

    match (obj.get("slot"), obj.get("pattern")) {
        (Some(_), Some(_)) => report.error(ErrorClass::Structure, subject, "binding has both 'slot' and 'pattern'"),
        (None, None) => report.error(ErrorClass::Structure, subject, "binding needs a 'slot' or a 'pattern'"),
        (Some(slot), None) => {
            if !slot.as_str().is_some_and(|s| !s.trim().is_empty()) {
                report.error(ErrorClass::Structure, subject, "'slot' must be a non-empty string");
            }
        }
        (None, Some(pattern)) => check_pattern(pattern, subject, report),
    }

    let mut parts: Vec<&Value> = Vec::new();
    if let Some(part) = obj.get("part") {
        parts.push(part);
    }
    match obj.get("parts") {
        Some(Value::Array(list)) => parts.extend(list),
        Some(_) => report.error(ErrorClass::Structure, subject, "'parts' must be an array"),
        None => {}
    }
    if parts.is_empty() {
        report.error(ErrorClass::Structure, subject, "binding supplies no part references");
    }
    for part in parts {
        match part.as_object() {
            Some(part) => {
                require_string(part, PART_TYPE_KEYS, subject, report);
            }
            None => report.error(ErrorClass::Structure, subject, "part reference must be a table/object"),
        }
    }
}

fn check_pattern(pattern: &Value, subject: &str, report: &mut ValidationReport) {
    let Some(obj) = pattern.as_object() else {
        report.error(ErrorClass::Structure, subject, "'pattern' must be a table/object");
        return;
    };
    if obj.len() != 1 {
        report.error(
            ErrorClass::Structure,
            subject,
            &format!("pattern must have exactly one of: {}", PATTERN_KINDS.join(", ")),
        );
        return;
    }
    let Some((kind, value)) = obj.iter().next() else {
        return;
    };
    match kind.as_str() {
        "group" => {
            if !value.as_str().is_some_and(|s| !s.trim().is_empty()) {
                report.error(ErrorClass::Structure, subject, "group pattern needs a non-empty name");
            }
        }
        "wildcard" => match value.as_str() {
            Some(glob) if glob.is_empty() => {
                report.error(ErrorClass::Structure, subject, "wildcard pattern is empty")
            }
            Some(glob) if !glob.contains('*') => report.error(
                ErrorClass::Structure,
                subject,
                &format!("wildcard '{}' contains no '*'; bind the slot by id instead", glob),
            ),
            Some(_) => {}
            None => report.error(ErrorClass::Structure, subject, "wildcard pattern must be a string"),
        },
        "properties" => match value.as_object() {
            Some(filters) if filters.is_empty() => {
                report.error(ErrorClass::Structure, subject, "property filter declares no keys")
            }
            Some(filters) => {
                for (key, value) in filters {
                    if !value.is_string() {
                        report.error(
                            ErrorClass::Structure,
                            subject,
                            &format!("property filter '{}' must have a string value", key),
                        );
                    }
                }
            }
            None => report.error(ErrorClass::Structure, subject, "property filter must be a table/object"),
        },
        other => report.error(
            ErrorClass::Structure,
            subject,
            &format!("unknown pattern kind '{}'", other),
        ),
    }
}

/// Require a non-empty string under one of `names`, reporting under the first
fn require_string<'v>(
    obj: &'v Map<String, Value>,
    names: &[&str],
    subject: &str,
    report: &mut ValidationReport,
) -> Option<&'v str> {
    match field(obj, names) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.as_str()),
        Some(Value::String(_)) => {
            report.error(ErrorClass::Structure, subject, &format!("'{}' is empty", names[0]));
            None
        }
        Some(other) => {
            report.error(
                ErrorClass::Structure,
                subject,
                &format!("'{}' must be a string, found {}", names[0], other),
            );
            None
        }
        None => {
            report.error(
                ErrorClass::Structure,
                subject,
                &format!("missing required field '{}'", names[0]),
            );
            None
        }
    }
}
