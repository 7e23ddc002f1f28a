//! Anatomy documents
//!
//! Blueprints, structure templates, recipes and part definitions, as read
//! from TOML or JSON, plus the registry that holds them once loaded.

pub mod recipe;
pub mod registry;
pub mod schema;
pub mod template;

pub use recipe::{
    Binding, BindingTarget, BodyDescriptors, Build, Composition, HairDensity, PartRef, Pattern,
    Recipe,
};
pub use registry::{AnatomyRegistry, PartCatalog};
pub use schema::{Blueprint, BlueprintSource, PartDefinition, SlotDef};
pub use template::{LimbSet, OrientationScheme, StructureTemplate};
