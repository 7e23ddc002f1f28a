//! Reading anatomy documents from disk.
//!
//! A data directory holds `blueprints/`, `templates/`, `recipes/` and
//! `parts/`, each with `.toml` or `.json` documents (subdirectories are
//! walked too). Every document passes Stage A before it is typed; documents
//! that fail are reported and skipped rather than aborting the load.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::blueprints::{
    AnatomyRegistry, Blueprint, Build, Composition, HairDensity, PartDefinition, Recipe,
    StructureTemplate,
};
use crate::core::{AnatomyConfig, ErrorClass, Result};
use crate::validation::{DocumentKind, SchemaValidator, Stage, ValidationReport};

const SECTIONS: &[(&str, DocumentKind)] = &[
    ("templates", DocumentKind::Template),
    ("blueprints", DocumentKind::Blueprint),
    ("recipes", DocumentKind::Recipe),
    ("parts", DocumentKind::Part),
];

/// Parse a document into a JSON value, whichever format it is in
pub fn parse_document(path: &Path, content: &str) -> Result<Value> {
    let is_json = path.extension().is_some_and(|ext| ext == "json");
    if is_json {
        Ok(serde_json::from_str(content)?)
    } else {
        let table: toml::Value = toml::from_str(content)?;
        Ok(serde_json::to_value(table)?)
    }
}

/// Load every document under `root` into a fresh registry.
///
/// Only I/O failures on the directory itself are errors; document problems
/// land in the returned Stage A report.
pub fn load_directory(root: &Path, config: &AnatomyConfig) -> Result<(AnatomyRegistry, ValidationReport)> {
    let mut registry = AnatomyRegistry::new();
    let mut report = ValidationReport::new(Stage::Schema);
    let validator = SchemaValidator::new(config);

    for (section, kind) in SECTIONS {
        let dir = root.join(section);
        if !dir.is_dir() {
            tracing::debug!(dir = %dir.display(), "no {} directory", section);
            continue;
        }
        let mut files = Vec::new();
        collect_documents(&dir, &mut files)?;
        files.sort();

        for path in files {
            load_document(&path, *kind, &validator, config, &mut registry, &mut report)?;
        }
    }

    tracing::info!(
        root = %root.display(),
        blueprints = registry.blueprint_ids().len(),
        recipes = registry.recipe_ids().len(),
        parts = registry.catalog().len(),
        errors = report.errors.len(),
        "loaded anatomy documents"
    );
    Ok((registry, report))
}

fn collect_documents(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_documents(&path, files)?;
        } else if path
            .extension()
            .is_some_and(|ext| ext == "toml" || ext == "json")
        {
            files.push(path);
        }
    }
    Ok(())
}

fn load_document(
    path: &Path,
    kind: DocumentKind,
    validator: &SchemaValidator<'_>,
    config: &AnatomyConfig,
    registry: &mut AnatomyRegistry,
    report: &mut ValidationReport,
) -> Result<()> {
    let subject = path.display().to_string();
    let content = std::fs::read_to_string(path)?;

    let mut doc = match parse_document(path, &content) {
        Ok(doc) => doc,
        Err(err) => {
            report.absorb(&err, &subject);
            return Ok(());
        }
    };

    let checked = validator.validate(kind, &doc, &subject);
    let passed = checked.is_valid();
    report.merge(checked);
    if !passed {
        return Ok(());
    }

    match kind {
        DocumentKind::Blueprint => {
            if let Some(blueprint) = typed::<Blueprint>(doc, &subject, report) {
                registry.register_blueprint(blueprint);
            }
        }
        DocumentKind::Template => {
            if let Some(template) = typed::<StructureTemplate>(doc, &subject, report) {
                registry.register_template(template);
            }
        }
        DocumentKind::Recipe => {
            if !config.descriptor_strict {
                drop_unknown_descriptors(&mut doc);
            }
            if let Some(recipe) = typed::<Recipe>(doc, &subject, report) {
                registry.register_recipe(recipe);
            }
        }
        DocumentKind::Part => {
            if let Some(part) = typed::<PartDefinition>(doc, &subject, report) {
                registry.register_part(part);
            }
        }
    }
    Ok(())
}

/// Remove descriptor values outside their vocabulary so a lenient load keeps
/// the recipe. Stage A has already warned about each one.
fn drop_unknown_descriptors(doc: &mut Value) {
    let Some(descriptors) = doc
        .as_object_mut()
        .and_then(|obj| {
            if obj.contains_key("descriptors") {
                obj.get_mut("descriptors")
            } else {
                obj.get_mut("bodyDescriptors")
            }
        })
        .and_then(Value::as_object_mut)
    else {
        return;
    };
    let vocabularies: [(&str, &[&str]); 3] = [
        ("build", Build::VALUES),
        ("density", HairDensity::VALUES),
        ("composition", Composition::VALUES),
    ];
    for (key, allowed) in vocabularies {
        let known = descriptors
            .get(key)
            .map_or(true, |v| v.as_str().is_some_and(|v| allowed.contains(&v)));
        if !known {
            descriptors.remove(key);
        }
    }
}

/// Deserialize a checked document, reporting anything Stage A let through
fn typed<T: DeserializeOwned>(doc: Value, subject: &str, report: &mut ValidationReport) -> Option<T> {
    match serde_json::from_value(doc) {
        Ok(value) => Some(value),
        Err(err) => {
            report.error(ErrorClass::Document, subject, &err.to_string());
            None
        }
    }
}
