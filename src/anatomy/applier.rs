//! Recipe application: bind parts into a slot skeleton.
//!
//! Explicit slot bindings are claimed first, then pattern bindings in recipe
//! order, each taking only slots nobody claimed yet. Parts are created after
//! all claims are settled, ordered by depth and skeleton position, so the
//! same set of claims always produces the same graph no matter how the
//! recipe spelled them.

use ahash::AHashMap;
use std::collections::{BTreeMap, BTreeSet};

use super::graph::{GeneratedGraph, PartNode, SlotSkeleton, SocketAssignment};
use super::matchers;
use crate::blueprints::{Binding, BindingTarget, PartRef, Recipe};
use crate::core::{config, AnatomyConfig, AnatomyError, PartId, Result, SlotId};

/// Applies recipes to skeletons
pub struct RecipeApplier<'a> {
    config: &'a AnatomyConfig,
}

impl Default for RecipeApplier<'static> {
    fn default() -> Self {
        Self::new(config())
    }
}

/// Which binding claimed a slot, and with which part
#[derive(Debug, Clone)]
struct Claim<'r> {
    binding: usize,
    part: &'r PartRef,
}

impl<'a> RecipeApplier<'a> {
    pub fn new(config: &'a AnatomyConfig) -> Self {
        Self { config }
    }

    pub fn apply(&self, recipe: &Recipe, skeleton: &SlotSkeleton) -> Result<GeneratedGraph> {
        let mut claims: BTreeMap<SlotId, Claim<'_>> = BTreeMap::new();
        let mut excess: BTreeSet<SlotId> = BTreeSet::new();

        for (idx, binding) in recipe.bindings.iter().enumerate() {
            if let BindingTarget::Slot(slot) = &binding.target {
                self.claim_explicit(idx, binding, slot, skeleton, &mut claims)?;
            }
        }

        for (idx, binding) in recipe.bindings.iter().enumerate() {
            if let BindingTarget::Pattern(_) = &binding.target {
                self.claim_pattern(idx, binding, skeleton, &mut claims, &mut excess)?;
            }
        }

        for (slot_id, claim) in &claims {
            let socket = skeleton
                .socket_for(slot_id)
                .ok_or_else(|| AnatomyError::UnknownSlot(slot_id.clone()))?;
            if !socket.accepts(&claim.part.part_type) {
                return Err(AnatomyError::IncompatiblePart {
                    slot: slot_id.clone(),
                    part_type: claim.part.part_type.clone(),
                    allowed: socket.allowed_types.clone(),
                });
            }
            if let Some(parent) = skeleton.slot(slot_id).and_then(|s| s.parent.as_ref()) {
                if !claims.contains_key(parent) {
                    return Err(AnatomyError::DetachedSlot {
                        slot: slot_id.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }

        let graph = materialize(recipe, skeleton, &claims, &excess);
        tracing::debug!(
            recipe = %recipe.id,
            parts = graph.parts.len(),
            unfilled = graph.sockets.iter().filter(|s| !s.is_filled()).count(),
            "applied recipe"
        );
        Ok(graph)
    }

    fn claim_explicit<'r>(
        &self,
        idx: usize,
        binding: &'r Binding,
        slot: &str,
        skeleton: &SlotSkeleton,
        claims: &mut BTreeMap<SlotId, Claim<'r>>,
    ) -> Result<()> {
        if !skeleton.contains(slot) {
            return Err(AnatomyError::UnknownSlot(slot.to_string()));
        }
        let part = binding
            .parts
            .first()
            .ok_or(AnatomyError::EmptyBinding { binding: idx })?;
        if binding.parts.len() > 1 {
            tracing::warn!(
                slot,
                extra = binding.parts.len() - 1,
                "explicit binding supplies more than one part; using the first"
            );
        }
        if let Some(existing) = claims.get(slot) {
            tracing::warn!(
                slot,
                first = existing.binding,
                ignored = idx,
                "slot bound more than once; keeping the first binding"
            );
            return Ok(());
        }
        claims.insert(slot.to_string(), Claim { binding: idx, part });
        Ok(())
    }

    fn claim_pattern<'r>(
        &self,
        idx: usize,
        binding: &'r Binding,
        skeleton: &SlotSkeleton,
        claims: &mut BTreeMap<SlotId, Claim<'r>>,
        excess: &mut BTreeSet<SlotId>,
    ) -> Result<()> {
        let BindingTarget::Pattern(pattern) = &binding.target else {
            return Ok(());
        };
        if binding.parts.is_empty() {
            return Err(AnatomyError::EmptyBinding { binding: idx });
        }

        let candidates = matchers::resolve(pattern, skeleton)?;
        if candidates.is_empty() && self.config.warn_on_empty_match {
            tracing::warn!(
                pattern = %pattern,
                optional = binding.optional,
                "pattern matched no slots"
            );
        }

        let open: Vec<SlotId> = candidates
            .into_iter()
            .filter(|slot| !claims.contains_key(slot))
            .collect();

        if binding.parts.len() == 1 {
            for slot in open {
                excess.remove(&slot);
                claims.insert(slot, Claim { binding: idx, part: &binding.parts[0] });
            }
            return Ok(());
        }

        let mut parts = binding.parts.iter();
        for slot in open {
            match parts.next() {
                Some(part) => {
                    excess.remove(&slot);
                    claims.insert(slot, Claim { binding: idx, part });
                }
                None => {
                    tracing::debug!(slot = %slot, pattern = %pattern, "more matches than parts; leaving slot empty");
                    excess.insert(slot);
                }
            }
        }
        let unused = parts.count();
        if unused > 0 {
            tracing::warn!(pattern = %pattern, unused, "pattern supplied more parts than it matched");
        }
        Ok(())
    }
}

fn materialize(
    recipe: &Recipe,
    skeleton: &SlotSkeleton,
    claims: &BTreeMap<SlotId, Claim<'_>>,
    excess: &BTreeSet<SlotId>,
) -> GeneratedGraph {
    let root = PartId::ROOT;
    let mut parts = vec![PartNode {
        id: root,
        part_type: skeleton.root_type.clone(),
        definition: None,
        slot: None,
        parent: None,
    }];

    let mut order: Vec<(usize, usize, &str)> = claims
        .keys()
        .filter_map(|slot| {
            skeleton
                .index_of(slot)
                .map(|idx| (skeleton.depth(slot), idx, slot.as_str()))
        })
        .collect();
    order.sort_unstable();

    let mut slot_parts: AHashMap<&str, PartId> = AHashMap::new();
    for (_, idx, slot_id) in order {
        let slot = &skeleton.slots()[idx];
        let claim = &claims[slot_id];
        let parent = match &slot.parent {
            Some(parent_slot) => slot_parts.get(parent_slot.as_str()).copied(),
            None => Some(root),
        };
        let id = PartId(parts.len() as u32);
        parts.push(PartNode {
            id,
            part_type: claim.part.part_type.clone(),
            definition: claim.part.definition.clone(),
            slot: Some(slot.id.clone()),
            parent,
        });
        slot_parts.insert(slot_id, id);
    }

    let sockets = skeleton
        .slots()
        .iter()
        .zip(skeleton.sockets())
        .map(|(slot, socket)| {
            let owner = match &slot.parent {
                Some(parent_slot) => slot_parts.get(parent_slot.as_str()).copied(),
                None => Some(root),
            };
            SocketAssignment {
                slot: slot.id.clone(),
                socket: socket.id.clone(),
                owner,
                allowed_types: socket.allowed_types.clone(),
                cardinality: socket.cardinality,
                occupant: slot_parts.get(slot.id.as_str()).copied(),
                excess_match: excess.contains(&slot.id),
            }
        })
        .collect();

    GeneratedGraph {
        blueprint_id: skeleton.blueprint_id.clone(),
        recipe_id: recipe.id.clone(),
        root,
        parts,
        sockets,
        descriptors: recipe.descriptors.clone().filter(|d| !d.is_empty()),
    }
}
