//! Anatomy graph generation
//!
//! A blueprint becomes a [`SlotSkeleton`] through the [`SlotGraphBuilder`];
//! a recipe then fills that skeleton with parts through the
//! [`RecipeApplier`], producing a [`GeneratedGraph`]. [`AnatomyGenerator`]
//! runs the whole pipeline with validation between the steps.

pub mod applier;
pub mod builder;
pub mod generator;
pub mod graph;
pub mod matchers;
pub mod naming;

pub use applier::RecipeApplier;
pub use builder::SlotGraphBuilder;
pub use generator::{failed_stage, AnatomyGenerator, GenerationRequest, Generated};
pub use graph::{
    GeneratedGraph, PartNode, Slot, SlotSkeleton, SlotSource, Socket, SocketAssignment,
};
pub use matchers::resolve;
pub use naming::NamingPattern;
