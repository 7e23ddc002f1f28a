//! Stage B: cross-document checks before generation.
//!
//! Builds the skeleton and resolves every binding against it, but never
//! produces a graph. Holds no state between calls, so any number of threads
//! can share one validator.

use std::collections::BTreeMap;

use super::{Stage, ValidationReport};
use crate::anatomy::{matchers, SlotGraphBuilder, SlotSkeleton};
use crate::blueprints::{
    Binding, BindingTarget, Blueprint, PartCatalog, PartRef, Recipe, StructureTemplate,
};
use crate::core::{config, AnatomyConfig, AnatomyError, ErrorClass, SlotId};

pub struct PreflightValidator<'a> {
    config: &'a AnatomyConfig,
}

impl Default for PreflightValidator<'static> {
    fn default() -> Self {
        Self::new(config())
    }
}

impl<'a> PreflightValidator<'a> {
    pub fn new(config: &'a AnatomyConfig) -> Self {
        Self { config }
    }

    pub fn validate(
        &self,
        blueprint: &Blueprint,
        template: Option<&StructureTemplate>,
        recipe: &Recipe,
        catalog: &PartCatalog,
    ) -> ValidationReport {
        let mut report = ValidationReport::new(Stage::PreFlight);
        let recipe_subject = format!("recipe '{}'", recipe.id);

        if let Some(pinned) = &recipe.blueprint {
            if pinned != &blueprint.id {
                report.error(
                    ErrorClass::Reference,
                    &recipe_subject,
                    &format!("written for blueprint '{}', not '{}'", pinned, blueprint.id),
                );
            }
        }

        let skeleton = match SlotGraphBuilder::new(self.config).build(blueprint, template) {
            Ok(skeleton) => skeleton,
            Err(err) => {
                report.absorb(&err, &format!("blueprint '{}'", blueprint.id));
                return report;
            }
        };

        if catalog.is_empty() {
            report.warn(
                ErrorClass::Reference,
                &recipe_subject,
                "part catalog is empty; part references were not checked",
            );
        }

        let mut claims: BTreeMap<SlotId, Vec<usize>> = BTreeMap::new();
        for (idx, binding) in recipe.bindings.iter().enumerate() {
            let subject = format!("{} binding {} ({})", recipe_subject, idx, binding.describe());
            if binding.parts.is_empty() {
                report.absorb(&AnatomyError::EmptyBinding { binding: idx }, &subject);
                continue;
            }
            if !catalog.is_empty() {
                for part in &binding.parts {
                    check_part_ref(part, catalog, &subject, &mut report);
                }
            }

            let targets = match self.targets(binding, &skeleton, &subject, &mut report) {
                Some(targets) => targets,
                None => continue,
            };
            for slot in targets {
                check_fit(binding, &slot, &skeleton, &subject, &mut report);
                claims.entry(slot).or_default().push(idx);
            }
        }

        for (slot, bindings) in &claims {
            if bindings.len() > 1 {
                report.warn(
                    ErrorClass::Structure,
                    &format!("slot '{}'", slot),
                    &format!(
                        "claimed by bindings {:?}; explicit bindings win, then the earliest pattern",
                        bindings
                    ),
                );
            }
        }

        for slot in skeleton.slots() {
            let subject = format!("slot '{}'", slot.id);
            if claims.contains_key(&slot.id) {
                if let Some(parent) = &slot.parent {
                    if !claims.contains_key(parent) {
                        report.absorb(
                            &AnatomyError::DetachedSlot {
                                slot: slot.id.clone(),
                                parent: parent.clone(),
                            },
                            &subject,
                        );
                    }
                }
            } else if slot.is_required() {
                report.warn(ErrorClass::Integrity, &subject, "required slot is not targeted by any binding");
            }
        }

        tracing::debug!(
            blueprint = %blueprint.id,
            recipe = %recipe.id,
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "pre-flight validation finished"
        );
        report
    }

    /// Slots a binding reaches, or None when it cannot be resolved
    fn targets(
        &self,
        binding: &Binding,
        skeleton: &SlotSkeleton,
        subject: &str,
        report: &mut ValidationReport,
    ) -> Option<Vec<SlotId>> {
        match &binding.target {
            BindingTarget::Slot(slot) => {
                if skeleton.contains(slot) {
                    Some(vec![slot.clone()])
                } else {
                    report.absorb(&AnatomyError::UnknownSlot(slot.clone()), subject);
                    None
                }
            }
            BindingTarget::Pattern(pattern) => match matchers::resolve(pattern, skeleton) {
                Ok(matched) if matched.is_empty() => {
                    if binding.optional {
                        if self.config.warn_on_empty_match {
                            report.warn(ErrorClass::Reference, subject, "optional pattern matched no slots");
                        }
                    } else {
                        report.error(ErrorClass::Reference, subject, "pattern matched no slots");
                    }
                    None
                }
                Ok(matched) => Some(matched.into_iter().collect()),
                Err(err) => {
                    report.absorb(&err, subject);
                    None
                }
            },
        }
    }
}

fn check_part_ref(part: &PartRef, catalog: &PartCatalog, subject: &str, report: &mut ValidationReport) {
    if !catalog.has_part_type(&part.part_type) {
        report.absorb(
            &AnatomyError::UnknownPartType {
                part_type: part.part_type.clone(),
                referrer: subject.to_string(),
            },
            subject,
        );
    }
    if let Some(definition) = &part.definition {
        match catalog.definition(definition) {
            None => report.absorb(
                &AnatomyError::UnknownPartDefinition {
                    definition: definition.clone(),
                    referrer: subject.to_string(),
                },
                subject,
            ),
            Some(def) if def.part_type != part.part_type => report.error(
                ErrorClass::Structure,
                subject,
                &format!(
                    "definition '{}' is a '{}', not a '{}'",
                    definition, def.part_type, part.part_type
                ),
            ),
            Some(_) => {}
        }
    }
}

/// Every targeted socket must accept at least one of the binding's parts.
/// Explicit and single-part bindings are checked exactly.
fn check_fit(
    binding: &Binding,
    slot: &str,
    skeleton: &SlotSkeleton,
    subject: &str,
    report: &mut ValidationReport,
) {
    let Some(socket) = skeleton.socket_for(slot) else {
        return;
    };
    if binding.parts.iter().any(|p| socket.accepts(&p.part_type)) {
        return;
    }
    let part_type = binding
        .parts
        .first()
        .map(|p| p.part_type.clone())
        .unwrap_or_default();
    report.absorb(
        &AnatomyError::IncompatiblePart {
            slot: slot.to_string(),
            part_type,
            allowed: socket.allowed_types.clone(),
        },
        subject,
    );
}
