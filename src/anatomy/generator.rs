//! The full generation pipeline.
//!
//! lookup → build → pre-flight → apply → integrity. Each call owns everything
//! it creates and only reads the registry, so batches run in parallel.

use rayon::prelude::*;

use super::applier::RecipeApplier;
use super::builder::SlotGraphBuilder;
use super::graph::GeneratedGraph;
use crate::blueprints::AnatomyRegistry;
use crate::core::{config, AnatomyConfig, AnatomyError, Result};
use crate::validation::{IntegrityValidator, PreflightValidator, ValidationReport};

/// One generation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub blueprint: String,
    pub recipe: String,
}

impl GenerationRequest {
    pub fn new(blueprint: impl Into<String>, recipe: impl Into<String>) -> Self {
        Self {
            blueprint: blueprint.into(),
            recipe: recipe.into(),
        }
    }
}

/// A generated graph with the warnings collected on the way
#[derive(Debug, Clone)]
pub struct Generated {
    pub graph: GeneratedGraph,
    pub preflight: ValidationReport,
    pub integrity: ValidationReport,
}

pub struct AnatomyGenerator<'a> {
    registry: &'a AnatomyRegistry,
    config: &'a AnatomyConfig,
}

impl<'a> AnatomyGenerator<'a> {
    /// Generator over a registry, using the global config
    pub fn new(registry: &'a AnatomyRegistry) -> Self {
        Self::with_config(registry, config())
    }

    pub fn with_config(registry: &'a AnatomyRegistry, config: &'a AnatomyConfig) -> Self {
        Self { registry, config }
    }

    /// Generate one anatomy graph
    pub fn generate(&self, blueprint_id: &str, recipe_id: &str) -> Result<GeneratedGraph> {
        self.generate_with_reports(blueprint_id, recipe_id)
            .map(|generated| generated.graph)
    }

    /// Generate one graph and keep the stage reports for their warnings
    pub fn generate_with_reports(&self, blueprint_id: &str, recipe_id: &str) -> Result<Generated> {
        let blueprint = self.registry.get_blueprint(blueprint_id)?;
        let recipe = self.registry.get_recipe(recipe_id)?;
        let template = self.registry.template_for(blueprint);

        // Build on its own first so builder failures surface as themselves,
        // not wrapped in a pre-flight report.
        let skeleton = SlotGraphBuilder::new(self.config).build(blueprint, template)?;

        let preflight = PreflightValidator::new(self.config)
            .validate(blueprint, template, recipe, self.registry.catalog())
            .into_result()?;
        for warning in &preflight.warnings {
            tracing::warn!(stage = %preflight.stage, "{}", warning);
        }

        let graph = RecipeApplier::new(self.config).apply(recipe, &skeleton)?;

        let integrity = IntegrityValidator::new(self.config)
            .validate(&graph)
            .into_result()?;
        for warning in &integrity.warnings {
            tracing::warn!(stage = %integrity.stage, "{}", warning);
        }

        tracing::info!(
            blueprint = blueprint_id,
            recipe = recipe_id,
            parts = graph.parts.len(),
            "generated anatomy"
        );
        Ok(Generated {
            graph,
            preflight,
            integrity,
        })
    }

    /// Generate many graphs in parallel; results keep request order
    pub fn generate_batch(&self, requests: &[GenerationRequest]) -> Vec<Result<GeneratedGraph>> {
        requests
            .par_iter()
            .map(|request| self.generate(&request.blueprint, &request.recipe))
            .collect()
    }
}

/// Stage that stopped a generation, if it was a validation stage
pub fn failed_stage(err: &AnatomyError) -> Option<crate::validation::Stage> {
    match err {
        AnatomyError::ValidationFailed { stage, .. } => Some(*stage),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprints::{Blueprint, PartDefinition, Recipe, StructureTemplate};
    use crate::core::ErrorClass;
    use crate::validation::Stage;

    const TEMPLATE: &str = r#"
id = "arachnid"

[[limb_sets]]
name = "legs"
count = 8
socket_pattern = "leg_{n}"
part_type = "leg"
orientation = "bilateral"
"#;

    const BLUEPRINT: &str = r#"
id = "spider"
schema_version = 2
root = "cephalothorax"
structure_template = "arachnid"
"#;

    const RECIPE: &str = r#"
id = "red_spider"
blueprint = "spider"

[[bindings]]
pattern = { wildcard = "leg_*" }
part = { part_type = "leg", definition = "spider_leg" }

[descriptors]
build = "skinny"
"#;

    fn registry() -> AnatomyRegistry {
        let mut registry = AnatomyRegistry::new();
        registry.register_template(toml::from_str::<StructureTemplate>(TEMPLATE).unwrap());
        registry.register_blueprint(toml::from_str::<Blueprint>(BLUEPRINT).unwrap());
        registry.register_recipe(toml::from_str::<Recipe>(RECIPE).unwrap());
        registry.register_part(PartDefinition {
            id: "spider_leg".into(),
            part_type: "leg".into(),
            tags: vec![],
        });
        registry
    }

    #[test]
    fn test_generate_spider() {
        let registry = registry();
        let graph = AnatomyGenerator::new(&registry)
            .generate("spider", "red_spider")
            .unwrap();
        assert_eq!(graph.parts.len(), 9);
        assert_eq!(graph.root_part().unwrap().part_type, "cephalothorax");
        assert_eq!(graph.filled_slots().count(), 8);
        assert!(graph.descriptors.is_some());
    }

    #[test]
    fn test_missing_documents_are_reference_errors() {
        let registry = registry();
        let generator = AnatomyGenerator::new(&registry);
        let err = generator.generate("scorpion", "red_spider").unwrap_err();
        assert_eq!(err.class(), ErrorClass::Reference);
        let err = generator.generate("spider", "black_widow").unwrap_err();
        assert_eq!(err.class(), ErrorClass::Reference);
    }

    #[test]
    fn test_preflight_failure_stops_generation() {
        let mut registry = registry();
        let mut recipe: Recipe = toml::from_str(RECIPE).unwrap();
        recipe.bindings[0].parts[0].definition = Some("crab_leg".into());
        registry.register_recipe(recipe);

        let err = AnatomyGenerator::new(&registry)
            .generate("spider", "red_spider")
            .unwrap_err();
        assert_eq!(failed_stage(&err), Some(Stage::PreFlight));
        assert_eq!(err.class(), ErrorClass::Reference);
    }

    #[test]
    fn test_batch_matches_sequential() {
        let registry = registry();
        let generator = AnatomyGenerator::new(&registry);
        let requests: Vec<GenerationRequest> = (0..16)
            .map(|i| {
                if i % 4 == 3 {
                    GenerationRequest::new("spider", "missing")
                } else {
                    GenerationRequest::new("spider", "red_spider")
                }
            })
            .collect();

        let expected = generator.generate("spider", "red_spider").unwrap();
        let results = generator.generate_batch(&requests);
        assert_eq!(results.len(), 16);
        for (i, result) in results.iter().enumerate() {
            if i % 4 == 3 {
                assert!(result.is_err());
            } else {
                assert_eq!(result.as_ref().unwrap(), &expected);
            }
        }
    }
}
