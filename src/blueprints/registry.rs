//! Registry of loaded anatomy documents.
//!
//! Holds every blueprint, structure template, recipe and part definition by
//! string id. Once loading finishes the registry is only read, so a single
//! `&AnatomyRegistry` can be shared across generation threads.

use ahash::AHashMap;
use std::collections::{BTreeMap, BTreeSet};

use super::recipe::Recipe;
use super::schema::{Blueprint, PartDefinition};
use super::template::StructureTemplate;
use crate::core::{AnatomyError, Result};

/// Known part types and concrete part definitions
#[derive(Debug, Clone, Default)]
pub struct PartCatalog {
    definitions: BTreeMap<String, PartDefinition>,
    part_types: BTreeSet<String>,
}

impl PartCatalog {
    /// Add a definition, returning the one it replaced
    pub fn insert(&mut self, definition: PartDefinition) -> Option<PartDefinition> {
        self.part_types.insert(definition.part_type.clone());
        self.definitions.insert(definition.id.clone(), definition)
    }

    pub fn definition(&self, id: &str) -> Option<&PartDefinition> {
        self.definitions.get(id)
    }

    pub fn has_part_type(&self, part_type: &str) -> bool {
        self.part_types.contains(part_type)
    }

    pub fn part_types(&self) -> impl Iterator<Item = &str> {
        self.part_types.iter().map(String::as_str)
    }

    /// Definitions of one part type, in id order
    pub fn definitions_of<'a>(&'a self, part_type: &'a str) -> impl Iterator<Item = &'a PartDefinition> {
        self.definitions.values().filter(move |d| d.part_type == part_type)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Registry for anatomy documents
#[derive(Debug, Default)]
pub struct AnatomyRegistry {
    blueprints: AHashMap<String, Blueprint>,
    templates: AHashMap<String, StructureTemplate>,
    recipes: AHashMap<String, Recipe>,
    catalog: PartCatalog,
}

impl AnatomyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a blueprint, replacing any with the same id
    pub fn register_blueprint(&mut self, blueprint: Blueprint) {
        if self.blueprints.contains_key(&blueprint.id) {
            tracing::warn!(id = %blueprint.id, "blueprint registered twice; keeping the latest");
        }
        self.blueprints.insert(blueprint.id.clone(), blueprint);
    }

    pub fn register_template(&mut self, template: StructureTemplate) {
        if self.templates.contains_key(&template.id) {
            tracing::warn!(id = %template.id, "structure template registered twice; keeping the latest");
        }
        self.templates.insert(template.id.clone(), template);
    }

    pub fn register_recipe(&mut self, recipe: Recipe) {
        if self.recipes.contains_key(&recipe.id) {
            tracing::warn!(id = %recipe.id, "recipe registered twice; keeping the latest");
        }
        self.recipes.insert(recipe.id.clone(), recipe);
    }

    pub fn register_part(&mut self, definition: PartDefinition) {
        if let Some(previous) = self.catalog.insert(definition) {
            tracing::warn!(id = %previous.id, "part definition registered twice; keeping the latest");
        }
    }

    pub fn blueprint(&self, id: &str) -> Option<&Blueprint> {
        self.blueprints.get(id)
    }

    pub fn template(&self, id: &str) -> Option<&StructureTemplate> {
        self.templates.get(id)
    }

    pub fn recipe(&self, id: &str) -> Option<&Recipe> {
        self.recipes.get(id)
    }

    pub fn catalog(&self) -> &PartCatalog {
        &self.catalog
    }

    /// Look up a blueprint, failing with a reference error
    pub fn get_blueprint(&self, id: &str) -> Result<&Blueprint> {
        self.blueprint(id)
            .ok_or_else(|| AnatomyError::BlueprintNotFound(id.to_string()))
    }

    pub fn get_recipe(&self, id: &str) -> Result<&Recipe> {
        self.recipe(id)
            .ok_or_else(|| AnatomyError::RecipeNotFound(id.to_string()))
    }

    /// The structure template a blueprint references, if it references one
    /// and it is loaded. Version 1 blueprints always get None.
    pub fn template_for(&self, blueprint: &Blueprint) -> Option<&StructureTemplate> {
        blueprint
            .structure_template
            .as_deref()
            .and_then(|id| self.template(id))
    }

    /// Blueprint ids in sorted order
    pub fn blueprint_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.blueprints.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Recipe ids in sorted order
    pub fn recipe_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.recipes.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Recipes pinned to the given blueprint, plus unpinned ones
    pub fn recipes_for<'a>(&'a self, blueprint: &'a str) -> impl Iterator<Item = &'a Recipe> {
        self.recipes
            .values()
            .filter(move |r| r.blueprint.as_deref().map_or(true, |b| b == blueprint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        let mut registry = AnatomyRegistry::new();
        let blueprint: Blueprint = toml::from_str(
            r#"
id = "spider"
schema_version = 2
root = "cephalothorax"
structure_template = "arachnid"
"#,
        )
        .unwrap();
        registry.register_blueprint(blueprint);
        registry.register_template(StructureTemplate {
            id: "arachnid".into(),
            limb_sets: vec![],
            appendages: vec![],
            groups: BTreeMap::new(),
        });

        let spider = registry.get_blueprint("spider").unwrap();
        assert_eq!(registry.template_for(spider).map(|t| t.id.as_str()), Some("arachnid"));
        assert!(matches!(
            registry.get_blueprint("scorpion"),
            Err(AnatomyError::BlueprintNotFound(_))
        ));
        assert!(matches!(
            registry.get_recipe("red_spider"),
            Err(AnatomyError::RecipeNotFound(_))
        ));
    }

    #[test]
    fn test_catalog_tracks_part_types() {
        let mut catalog = PartCatalog::default();
        assert!(catalog.is_empty());
        catalog.insert(PartDefinition {
            id: "spider_leg_segmented".into(),
            part_type: "leg".into(),
            tags: vec!["chitin".into()],
        });
        assert!(catalog.has_part_type("leg"));
        assert!(!catalog.has_part_type("wing"));
        assert_eq!(catalog.definitions_of("leg").count(), 1);
        assert_eq!(catalog.definition("spider_leg_segmented").unwrap().tags, vec!["chitin"]);
    }

    #[test]
    fn test_registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AnatomyRegistry>();
    }
}
