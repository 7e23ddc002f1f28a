//! Blueprint → slot skeleton generation.
//!
//! Version 1 blueprints are copied slot by slot; version 2 blueprints expand
//! their structure template and then merge the overlay. Every check happens
//! while the skeleton is still a local value, so a failed build never hands
//! out a partial skeleton.

use std::collections::{BTreeMap, BTreeSet};

use super::graph::{Slot, SlotSkeleton, SlotSource, Socket};
use super::naming::NamingPattern;
use crate::blueprints::{
    Blueprint, BlueprintSource, LimbSet, OrientationScheme, SlotDef, StructureTemplate,
};
use crate::core::{config, AnatomyConfig, AnatomyError, Result, SocketOwner};

/// Builds slot skeletons from blueprints
pub struct SlotGraphBuilder<'a> {
    config: &'a AnatomyConfig,
}

impl Default for SlotGraphBuilder<'static> {
    fn default() -> Self {
        Self::new(config())
    }
}

impl<'a> SlotGraphBuilder<'a> {
    pub fn new(config: &'a AnatomyConfig) -> Self {
        Self { config }
    }

    /// Build the skeleton for a blueprint.
    ///
    /// `template` must be supplied for version 2 blueprints and must be the
    /// template the blueprint references.
    pub fn build(
        &self,
        blueprint: &Blueprint,
        template: Option<&StructureTemplate>,
    ) -> Result<SlotSkeleton> {
        let skeleton = match blueprint.source()? {
            BlueprintSource::Manual { slots } => {
                if let Some(template) = template {
                    return Err(AnatomyError::SchemaVersionMismatch {
                        blueprint: blueprint.id.clone(),
                        version: blueprint.schema_version,
                        detail: format!("was supplied structure template '{}'", template.id),
                    });
                }
                self.build_manual(blueprint, slots)?
            }
            BlueprintSource::Templated {
                template: template_ref,
                additional_slots,
            } => {
                let template = template
                    .filter(|t| t.id == template_ref)
                    .ok_or_else(|| AnatomyError::TemplateNotFound {
                        blueprint: blueprint.id.clone(),
                        template: template_ref.to_string(),
                    })?;
                self.build_templated(blueprint, template, additional_slots)?
            }
        };

        check_parents(&skeleton)?;
        check_sockets(&skeleton)?;

        tracing::debug!(
            blueprint = %blueprint.id,
            slots = skeleton.len(),
            "built slot skeleton"
        );
        Ok(skeleton)
    }

    fn build_manual(&self, blueprint: &Blueprint, slots: &[SlotDef]) -> Result<SlotSkeleton> {
        let mut skeleton = SlotSkeleton::new(&blueprint.id, &blueprint.root);
        for def in slots {
            if def.part_type.trim().is_empty() {
                return Err(AnatomyError::MissingPartType(def.id.clone()));
            }
            let (slot, socket) = slot_from_def(def, SlotSource::Manual);
            if !skeleton.push(slot, socket) {
                return Err(AnatomyError::DuplicateSlotId(def.id.clone()));
            }
        }
        Ok(skeleton)
    }

    fn build_templated(
        &self,
        blueprint: &Blueprint,
        template: &StructureTemplate,
        additional_slots: &[SlotDef],
    ) -> Result<SlotSkeleton> {
        let mut skeleton = SlotSkeleton::new(&blueprint.id, &blueprint.root);

        for name in template.group_names() {
            skeleton.declare_group(name);
        }

        for unit in template.units() {
            self.expand_limb_set(&mut skeleton, template, unit)?;
        }

        for def in additional_slots {
            merge_additional(&mut skeleton, def)?;
        }

        Ok(skeleton)
    }

    fn expand_limb_set(
        &self,
        skeleton: &mut SlotSkeleton,
        template: &StructureTemplate,
        unit: &LimbSet,
    ) -> Result<()> {
        let max = self.config.max_limb_count;
        if unit.count < 1 || unit.count > i64::from(max) {
            return Err(AnatomyError::InvalidLimbCount {
                limb_set: unit.name.clone(),
                count: unit.count,
                max,
            });
        }
        if unit.part_type.trim().is_empty() {
            return Err(AnatomyError::MissingPartType(unit.name.clone()));
        }
        let invalid_pattern = |reason: String| AnatomyError::InvalidNamingPattern {
            limb_set: unit.name.clone(),
            pattern: unit.socket_pattern.clone(),
            reason,
        };
        let pattern = NamingPattern::parse(&unit.socket_pattern).map_err(invalid_pattern)?;
        if let OrientationScheme::Explicit(list) = &unit.orientation {
            if list.len() as i64 != unit.count {
                return Err(AnatomyError::OrientationCountMismatch {
                    limb_set: unit.name.clone(),
                    given: list.len(),
                    count: unit.count,
                });
            }
        }

        let mut groups: BTreeSet<String> = BTreeSet::new();
        groups.insert(unit.name.clone());
        groups.extend(template.groups_containing(&unit.name).map(str::to_string));

        let mut allowed_types = vec![unit.part_type.clone()];
        for extra in &unit.allowed_types {
            if !allowed_types.contains(extra) {
                allowed_types.push(extra.clone());
            }
        }

        for i in 0..unit.count as usize {
            let index = unit
                .start_index
                .checked_add(i as u32)
                .ok_or_else(|| {
                    invalid_pattern(format!("index overflows from start_index {}", unit.start_index))
                })?;
            let orientation = unit.orientation.orientation_for(i);
            let id = pattern
                .render(index, orientation.as_deref())
                .map_err(invalid_pattern)?;
            if skeleton.contains(&id) {
                return Err(invalid_pattern(format!(
                    "generates slot id '{}' more than once",
                    id
                )));
            }

            let mut properties = unit.properties.clone();
            properties.insert("limb_set".to_string(), unit.name.clone());

            let slot = Slot {
                id: id.clone(),
                part_type: unit.part_type.clone(),
                socket: id.clone(),
                parent: unit.parent.clone(),
                cardinality: unit.cardinality(),
                orientation,
                groups: groups.clone(),
                properties,
                source: SlotSource::Template {
                    limb_set: unit.name.clone(),
                    index,
                },
            };
            let socket = Socket {
                id,
                owner: slot.owner(),
                allowed_types: allowed_types.clone(),
                cardinality: slot.cardinality.socket(),
                occupant: None,
            };
            skeleton.push(slot, socket);
        }

        tracing::debug!(limb_set = %unit.name, count = unit.count, "expanded limb set");
        Ok(())
    }
}

fn slot_from_def(def: &SlotDef, source: SlotSource) -> (Slot, Socket) {
    let socket_id = def.socket.clone().unwrap_or_else(|| def.id.clone());
    let mut allowed_types = vec![def.part_type.clone()];
    for extra in &def.allowed_types {
        if !allowed_types.contains(extra) {
            allowed_types.push(extra.clone());
        }
    }
    let slot = Slot {
        id: def.id.clone(),
        part_type: def.part_type.clone(),
        socket: socket_id.clone(),
        parent: def.parent.clone(),
        cardinality: def.cardinality(),
        orientation: def.orientation.clone(),
        groups: def.groups.iter().cloned().collect(),
        properties: def.properties.clone(),
        source,
    };
    let socket = Socket {
        id: socket_id,
        owner: slot.owner(),
        allowed_types,
        cardinality: slot.cardinality.socket(),
        occupant: None,
    };
    (slot, socket)
}

/// Apply one overlay slot: append new ids, extend identical shapes, reject conflicts
fn merge_additional(skeleton: &mut SlotSkeleton, def: &SlotDef) -> Result<()> {
    if def.part_type.trim().is_empty() {
        return Err(AnatomyError::MissingPartType(def.id.clone()));
    }

    let Some((slot, socket)) = skeleton.slot_mut(&def.id) else {
        let (slot, socket) = slot_from_def(def, SlotSource::Additional);
        skeleton.push(slot, socket);
        return Ok(());
    };

    let conflict = |detail: String| AnatomyError::SlotShapeConflict {
        slot: def.id.clone(),
        detail,
    };
    if slot.part_type != def.part_type {
        return Err(conflict(format!(
            "part type '{}' redefined as '{}'",
            slot.part_type, def.part_type
        )));
    }
    if slot.cardinality != def.cardinality() {
        return Err(conflict(format!(
            "cardinality {:?} redefined as {:?}",
            slot.cardinality,
            def.cardinality()
        )));
    }
    if let Some(parent) = &def.parent {
        if slot.parent.as_ref() != Some(parent) {
            return Err(conflict(format!(
                "parent {:?} redefined as '{}'",
                slot.parent, parent
            )));
        }
    }
    if let Some(socket_name) = &def.socket {
        if &slot.socket != socket_name {
            return Err(conflict(format!(
                "socket '{}' redefined as '{}'",
                slot.socket, socket_name
            )));
        }
    }
    if let (Some(existing), Some(incoming)) = (&slot.orientation, &def.orientation) {
        if existing != incoming {
            return Err(conflict(format!(
                "orientation '{}' redefined as '{}'",
                existing, incoming
            )));
        }
    }

    // Identical shape: extend in place
    if slot.orientation.is_none() {
        slot.orientation = def.orientation.clone();
    }
    let new_groups: Vec<String> = def
        .groups
        .iter()
        .filter(|g| !slot.groups.contains(*g))
        .cloned()
        .collect();
    slot.groups.extend(new_groups.iter().cloned());
    merge_properties(&mut slot.properties, &def.properties);
    for extra in &def.allowed_types {
        if !socket.accepts(extra) {
            socket.allowed_types.push(extra.clone());
        }
    }
    for group in new_groups {
        skeleton.declare_group(group);
    }

    tracing::debug!(slot = %def.id, "extended generated slot");
    Ok(())
}

fn merge_properties(target: &mut BTreeMap<String, String>, extra: &BTreeMap<String, String>) {
    for (key, value) in extra {
        target.insert(key.clone(), value.clone());
    }
}

/// Parents must exist and the parent relation must be acyclic
fn check_parents(skeleton: &SlotSkeleton) -> Result<()> {
    for slot in skeleton.slots() {
        if let Some(parent) = &slot.parent {
            if !skeleton.contains(parent) {
                return Err(AnatomyError::UnknownParentSlot {
                    slot: slot.id.clone(),
                    parent: parent.clone(),
                });
            }
        }
    }

    for slot in skeleton.slots() {
        let mut seen = BTreeSet::new();
        let mut current = Some(slot.id.as_str());
        while let Some(id) = current {
            if !seen.insert(id) {
                return Err(AnatomyError::SlotCycle(slot.id.clone()));
            }
            current = skeleton.slot(id).and_then(|s| s.parent.as_deref());
        }
    }
    Ok(())
}

/// A socket name may be used once per owner
fn check_sockets(skeleton: &SlotSkeleton) -> Result<()> {
    let mut seen: BTreeSet<(&SocketOwner, &str)> = BTreeSet::new();
    for socket in skeleton.sockets() {
        if !seen.insert((&socket.owner, socket.id.as_str())) {
            return Err(AnatomyError::DuplicateSocket {
                socket: socket.id.clone(),
                owner: socket.owner.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ErrorClass, SlotCardinality};

    fn limb_set(name: &str, count: i64, pattern: &str, part_type: &str) -> LimbSet {
        LimbSet {
            name: name.into(),
            count,
            socket_pattern: pattern.into(),
            part_type: part_type.into(),
            optional: false,
            orientation: OrientationScheme::Indexed,
            parent: None,
            start_index: 0,
            allowed_types: vec![],
            properties: BTreeMap::new(),
        }
    }

    fn templated(template: &str, additional: Vec<SlotDef>) -> Blueprint {
        Blueprint {
            id: "creature".into(),
            schema_version: 2,
            root: "torso".into(),
            slots: None,
            structure_template: Some(template.into()),
            additional_slots: additional,
        }
    }

    fn spider_template() -> StructureTemplate {
        StructureTemplate {
            id: "arachnid".into(),
            limb_sets: vec![limb_set("legs", 8, "leg_{n}", "spider_leg")],
            appendages: vec![limb_set("abdomen", 1, "abdomen", "spider_abdomen")],
            groups: BTreeMap::new(),
        }
    }

    #[test]
    fn test_manual_blueprint_copies_slots() {
        let mut eye = SlotDef::new("left_eye", "eye");
        eye.parent = Some("head".into());
        let blueprint = Blueprint {
            id: "human".into(),
            schema_version: 1,
            root: "torso".into(),
            slots: Some(vec![SlotDef::new("head", "head"), eye]),
            structure_template: None,
            additional_slots: vec![],
        };
        let skeleton = SlotGraphBuilder::default().build(&blueprint, None).unwrap();
        assert_eq!(skeleton.len(), 2);
        assert_eq!(skeleton.root_type, "torso");
        assert_eq!(
            skeleton.socket_for("left_eye").unwrap().owner,
            SocketOwner::Slot("head".into())
        );
    }

    #[test]
    fn test_manual_rejects_duplicates_and_blank_types() {
        let mut blueprint = Blueprint {
            id: "bad".into(),
            schema_version: 1,
            root: "torso".into(),
            slots: Some(vec![SlotDef::new("head", "head"), SlotDef::new("head", "head")]),
            structure_template: None,
            additional_slots: vec![],
        };
        let builder = SlotGraphBuilder::default();
        assert!(matches!(
            builder.build(&blueprint, None),
            Err(AnatomyError::DuplicateSlotId(id)) if id == "head"
        ));

        blueprint.slots = Some(vec![SlotDef::new("head", " ")]);
        assert!(matches!(
            builder.build(&blueprint, None),
            Err(AnatomyError::MissingPartType(_))
        ));
    }

    #[test]
    fn test_manual_rejects_parent_cycle() {
        let mut a = SlotDef::new("a", "limb");
        a.parent = Some("b".into());
        let mut b = SlotDef::new("b", "limb");
        b.parent = Some("a".into());
        let blueprint = Blueprint {
            id: "loop".into(),
            schema_version: 1,
            root: "torso".into(),
            slots: Some(vec![a, b]),
            structure_template: None,
            additional_slots: vec![],
        };
        let err = SlotGraphBuilder::default().build(&blueprint, None).unwrap_err();
        assert!(matches!(err, AnatomyError::SlotCycle(_)));
        assert_eq!(err.class(), ErrorClass::Structure);
    }

    #[test]
    fn test_manual_rejects_unknown_parent() {
        let mut claw = SlotDef::new("claw", "claw");
        claw.parent = Some("arm".into());
        let blueprint = Blueprint {
            id: "crab".into(),
            schema_version: 1,
            root: "carapace".into(),
            slots: Some(vec![claw]),
            structure_template: None,
            additional_slots: vec![],
        };
        let err = SlotGraphBuilder::default().build(&blueprint, None).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Reference);
    }

    #[test]
    fn test_template_expansion() {
        let skeleton = SlotGraphBuilder::default()
            .build(&templated("arachnid", vec![]), Some(&spider_template()))
            .unwrap();
        let ids: Vec<&str> = skeleton.slot_ids().collect();
        assert_eq!(
            ids,
            vec!["leg_0", "leg_1", "leg_2", "leg_3", "leg_4", "leg_5", "leg_6", "leg_7", "abdomen"]
        );
        let leg = skeleton.slot("leg_3").unwrap();
        assert!(leg.groups.contains("legs"));
        assert_eq!(
            leg.source,
            SlotSource::Template {
                limb_set: "legs".into(),
                index: 3
            }
        );
        assert_eq!(leg.properties.get("limb_set").map(String::as_str), Some("legs"));
    }

    #[test]
    fn test_template_group_metadata_and_orientation() {
        let mut wings = limb_set("wings", 2, "{orientation}_wing", "wing");
        wings.orientation = OrientationScheme::Bilateral;
        let mut tail = limb_set("tail", 1, "tail", "tail");
        tail.optional = true;
        let mut template = StructureTemplate {
            id: "dragon".into(),
            limb_sets: vec![limb_set("legs", 4, "leg_{n}", "leg")],
            appendages: vec![wings, tail],
            groups: BTreeMap::new(),
        };
        template
            .groups
            .insert("appendages".into(), vec!["wings".into(), "tail".into()]);
        template.groups.insert("horns".into(), vec![]);

        let skeleton = SlotGraphBuilder::default()
            .build(&templated("dragon", vec![]), Some(&template))
            .unwrap();
        let wing = skeleton.slot("right_wing").unwrap();
        assert_eq!(wing.orientation.as_deref(), Some("right"));
        assert!(wing.groups.contains("appendages"));
        assert_eq!(
            skeleton.slot("tail").unwrap().cardinality,
            SlotCardinality::Optional
        );
        assert!(skeleton.has_group("horns"));
    }

    #[test]
    fn test_invalid_counts() {
        let builder = SlotGraphBuilder::default();
        for count in [0, -2, 65] {
            let mut template = spider_template();
            template.limb_sets[0].count = count;
            let err = builder
                .build(&templated("arachnid", vec![]), Some(&template))
                .unwrap_err();
            assert!(matches!(err, AnatomyError::InvalidLimbCount { .. }));
        }
    }

    #[test]
    fn test_start_index_overflow_is_rejected() {
        let mut template = spider_template();
        template.limb_sets[0].count = 2;
        template.limb_sets[0].start_index = u32::MAX;
        let err = SlotGraphBuilder::default()
            .build(&templated("arachnid", vec![]), Some(&template))
            .unwrap_err();
        assert!(matches!(err, AnatomyError::InvalidNamingPattern { .. }));
        assert_eq!(err.class(), ErrorClass::Structure);

        template.limb_sets[0].count = 1;
        let skeleton = SlotGraphBuilder::default()
            .build(&templated("arachnid", vec![]), Some(&template))
            .unwrap();
        assert!(skeleton.contains(&format!("leg_{}", u32::MAX)));
    }

    #[test]
    fn test_pattern_without_index_collides() {
        let mut template = spider_template();
        template.limb_sets[0].socket_pattern = "leg".into();
        let err = SlotGraphBuilder::default()
            .build(&templated("arachnid", vec![]), Some(&template))
            .unwrap_err();
        assert!(matches!(err, AnatomyError::InvalidNamingPattern { .. }));
    }

    #[test]
    fn test_missing_template_is_reference_error() {
        let builder = SlotGraphBuilder::default();
        let err = builder.build(&templated("arachnid", vec![]), None).unwrap_err();
        assert!(matches!(err, AnatomyError::TemplateNotFound { .. }));
        assert_eq!(err.class(), ErrorClass::Reference);

        let mut other = spider_template();
        other.id = "insectoid".into();
        let err = builder
            .build(&templated("arachnid", vec![]), Some(&other))
            .unwrap_err();
        assert!(matches!(err, AnatomyError::TemplateNotFound { .. }));
    }

    #[test]
    fn test_additional_slots_append_and_extend() {
        let mut extended = SlotDef::new("leg_0", "spider_leg");
        extended.properties.insert("venomous".into(), "true".into());
        extended.groups.push("front_legs".into());
        let mut spinneret = SlotDef::new("spinneret", "spinneret");
        spinneret.parent = Some("abdomen".into());

        let skeleton = SlotGraphBuilder::default()
            .build(
                &templated("arachnid", vec![extended, spinneret]),
                Some(&spider_template()),
            )
            .unwrap();
        assert_eq!(skeleton.len(), 10);
        assert_eq!(skeleton.slot_ids().last(), Some("spinneret"));
        let leg = skeleton.slot("leg_0").unwrap();
        assert_eq!(leg.properties.get("venomous").map(String::as_str), Some("true"));
        assert!(leg.groups.contains("front_legs"));
        assert!(skeleton.has_group("front_legs"));
        assert_eq!(skeleton.slot("spinneret").unwrap().source, SlotSource::Additional);
    }

    #[test]
    fn test_additional_slot_shape_conflict() {
        let builder = SlotGraphBuilder::default();
        let conflicting = SlotDef::new("leg_2", "tentacle");
        let err = builder
            .build(&templated("arachnid", vec![conflicting]), Some(&spider_template()))
            .unwrap_err();
        assert!(matches!(err, AnatomyError::SlotShapeConflict { ref slot, .. } if slot == "leg_2"));
        assert_eq!(err.class(), ErrorClass::Structure);

        let mut optional = SlotDef::new("leg_2", "spider_leg");
        optional.optional = true;
        assert!(builder
            .build(&templated("arachnid", vec![optional]), Some(&spider_template()))
            .is_err());
    }

    #[test]
    fn test_template_generation_is_deterministic() {
        let builder = SlotGraphBuilder::default();
        let blueprint = templated("arachnid", vec![SlotDef::new("spinneret", "spinneret")]);
        let template = spider_template();
        let first = builder.build(&blueprint, Some(&template)).unwrap();
        let second = builder.build(&blueprint, Some(&template)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_limb_set_parent_must_exist() {
        let mut template = spider_template();
        let mut antennae = limb_set("antennae", 2, "antenna_{n}", "antenna");
        antennae.parent = Some("head".into());
        template.appendages.push(antennae);
        let err = SlotGraphBuilder::default()
            .build(&templated("arachnid", vec![]), Some(&template))
            .unwrap_err();
        assert!(matches!(err, AnatomyError::UnknownParentSlot { .. }));
    }
}
