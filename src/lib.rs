//! Arc Anatomy - procedural anatomy graphs for game entities
//!
//! Blueprints declare where a body's slots come from, recipes say which parts
//! fill them, and the generator turns the pair into a validated part graph.

pub mod anatomy;
pub mod blueprints;
pub mod core;
pub mod loader;
pub mod validation;
