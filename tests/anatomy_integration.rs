//! Anatomy generation integration tests
//!
//! Full pipeline runs over inline TOML documents: templates expanding into
//! skeletons, recipes binding parts by id and by pattern, and the three
//! validation stages around them.

use arc_anatomy::anatomy::{AnatomyGenerator, RecipeApplier, SlotGraphBuilder};
use arc_anatomy::blueprints::*;
use arc_anatomy::core::{AnatomyError, ErrorClass};
use arc_anatomy::validation::{IntegrityValidator, PreflightValidator, Stage};

const SPIDER_TEMPLATE: &str = r#"
id = "arachnid"

[[limb_sets]]
name = "legs"
count = 8
socket_pattern = "leg_{n}"
part_type = "leg"
orientation = "bilateral"
"#;

const SPIDER_BLUEPRINT: &str = r#"
id = "spider"
schema_version = 2
root = "cephalothorax"
structure_template = "arachnid"
"#;

const DRAGON_TEMPLATE: &str = r#"
id = "winged_quadruped"

[[limb_sets]]
name = "legs"
count = 4
socket_pattern = "leg_{n}"
part_type = "leg"

[[appendages]]
name = "wings"
count = 2
socket_pattern = "{orientation}_wing"
part_type = "wing"
orientation = "bilateral"

[[appendages]]
name = "tail"
count = 1
socket_pattern = "tail"
part_type = "tail"

[groups]
flight = ["wings"]
"#;

const DRAGON_BLUEPRINT: &str = r#"
id = "dragon"
schema_version = 2
root = "torso"
structure_template = "winged_quadruped"
"#;

fn template(toml_str: &str) -> StructureTemplate {
    toml::from_str(toml_str).expect("template parses")
}

fn blueprint(toml_str: &str) -> Blueprint {
    toml::from_str(toml_str).expect("blueprint parses")
}

fn recipe(toml_str: &str) -> Recipe {
    toml::from_str(toml_str).expect("recipe parses")
}

#[test]
fn test_v1_slot_count_matches_declaration() {
    let human = blueprint(
        r#"
id = "human"
root = "torso"

[[slots]]
id = "head"
part_type = "head"

[[slots]]
id = "left_eye"
part_type = "eye"
parent = "head"
orientation = "left"

[[slots]]
id = "right_eye"
part_type = "eye"
parent = "head"
orientation = "right"

[[slots]]
id = "left_arm"
part_type = "arm"
"#,
    );
    let skeleton = SlotGraphBuilder::default().build(&human, None).unwrap();
    assert_eq!(skeleton.len(), 4);
    let ids: Vec<&str> = skeleton.slot_ids().collect();
    assert_eq!(ids, vec!["head", "left_eye", "right_eye", "left_arm"]);
}

#[test]
fn test_scenario_a_eight_legs_by_wildcard() {
    let skeleton = SlotGraphBuilder::default()
        .build(&blueprint(SPIDER_BLUEPRINT), Some(&template(SPIDER_TEMPLATE)))
        .unwrap();
    let ids: Vec<&str> = skeleton.slot_ids().collect();
    let expected: Vec<String> = (0..8).map(|i| format!("leg_{}", i)).collect();
    assert_eq!(ids, expected);

    let r = recipe(
        r#"
id = "red_spider"
[[bindings]]
pattern = { wildcard = "leg_*" }
part = { part_type = "leg" }
"#,
    );
    let graph = RecipeApplier::default().apply(&r, &skeleton).unwrap();
    assert_eq!(graph.filled_slots().count(), 8);
    assert_eq!(graph.children_of(graph.root).count(), 8);
}

#[test]
fn test_scenario_b_group_bindings_cover_every_slot() {
    let bp = blueprint(DRAGON_BLUEPRINT);
    let tpl = template(DRAGON_TEMPLATE);
    let skeleton = SlotGraphBuilder::default().build(&bp, Some(&tpl)).unwrap();
    assert_eq!(skeleton.len(), 7);

    let r = recipe(
        r#"
id = "green_dragon"
blueprint = "dragon"

[[bindings]]
pattern = { group = "legs" }
part = { part_type = "leg" }

[[bindings]]
pattern = { group = "wings" }
part = { part_type = "wing" }

[[bindings]]
pattern = { group = "tail" }
part = { part_type = "tail" }

[descriptors]
build = "muscular"
skin_color = "emerald"
"#,
    );

    let preflight = PreflightValidator::default().validate(&bp, Some(&tpl), &r, &PartCatalog::default());
    assert!(preflight.is_valid(), "{}", preflight);

    let graph = RecipeApplier::default().apply(&r, &skeleton).unwrap();
    for slot in skeleton.slot_ids() {
        let filled = graph.sockets.iter().filter(|s| s.slot == slot && s.is_filled()).count();
        assert_eq!(filled, 1, "slot {} filled {} times", slot, filled);
    }
    let occupants: std::collections::BTreeSet<_> = graph.sockets.iter().filter_map(|s| s.occupant).collect();
    assert_eq!(occupants.len(), 7);

    let integrity = IntegrityValidator::default().validate(&graph);
    assert!(integrity.is_valid(), "{}", integrity);
    assert_eq!(
        graph.descriptors.as_ref().and_then(|d| d.skin_color.as_deref()),
        Some("emerald")
    );
}

#[test]
fn test_scenario_c_missing_template_is_reference_error() {
    let mut registry = AnatomyRegistry::new();
    registry.register_blueprint(blueprint(SPIDER_BLUEPRINT));
    registry.register_recipe(recipe(
        r#"
id = "red_spider"
[[bindings]]
pattern = { wildcard = "leg_*" }
part = { part_type = "leg" }
"#,
    ));

    let direct = SlotGraphBuilder::default().build(&blueprint(SPIDER_BLUEPRINT), None);
    assert!(matches!(direct, Err(AnatomyError::TemplateNotFound { .. })));

    let err = AnatomyGenerator::new(&registry)
        .generate("spider", "red_spider")
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Reference);
    assert!(err.report().is_none());
}

#[test]
fn test_scenario_d_conflicting_additional_slot() {
    let bp = blueprint(
        r#"
id = "spider"
schema_version = 2
root = "cephalothorax"
structure_template = "arachnid"

[[additional_slots]]
id = "leg_3"
part_type = "pincer"
"#,
    );
    let err = SlotGraphBuilder::default()
        .build(&bp, Some(&template(SPIDER_TEMPLATE)))
        .unwrap_err();
    assert!(matches!(err, AnatomyError::SlotShapeConflict { .. }));
    assert_eq!(err.class(), ErrorClass::Structure);
}

#[test]
fn test_explicit_and_pattern_bindings_produce_same_graph() {
    let skeleton = SlotGraphBuilder::default()
        .build(&blueprint(DRAGON_BLUEPRINT), Some(&template(DRAGON_TEMPLATE)))
        .unwrap();

    let by_pattern = Recipe {
        id: "dragon".into(),
        blueprint: None,
        bindings: vec![
            Binding::pattern(Pattern::Wildcard("leg_*".into()), vec![PartRef::of_type("leg")]),
            Binding::pattern(Pattern::Group("flight".into()), vec![PartRef::of_type("wing")]),
            Binding::slot("tail", PartRef::of_type("tail")),
        ],
        descriptors: None,
    };

    let applier = RecipeApplier::default();
    let pattern_graph = applier.apply(&by_pattern, &skeleton).unwrap();

    // enumerate the same slots explicitly, in reverse to shake out order effects
    let mut explicit_bindings: Vec<Binding> = pattern_graph
        .parts
        .iter()
        .filter_map(|p| p.slot.as_ref().map(|s| Binding::slot(s.clone(), PartRef::of_type(p.part_type.clone()))))
        .collect();
    explicit_bindings.reverse();
    let by_slot = Recipe {
        bindings: explicit_bindings,
        ..by_pattern.clone()
    };
    let explicit_graph = applier.apply(&by_slot, &skeleton).unwrap();

    assert_eq!(pattern_graph, explicit_graph);
}

#[test]
fn test_property_filters_against_generated_slots() {
    let skeleton = SlotGraphBuilder::default()
        .build(&blueprint(SPIDER_BLUEPRINT), Some(&template(SPIDER_TEMPLATE)))
        .unwrap();
    let r = recipe(
        r#"
id = "lopsided"
[[bindings]]
pattern = { properties = { orientation = "left", slot_type = "leg" } }
part = { part_type = "leg", definition = "long_leg" }

[[bindings]]
pattern = { wildcard = "leg_*" }
part = { part_type = "leg", definition = "short_leg" }
"#,
    );
    let graph = RecipeApplier::default().apply(&r, &skeleton).unwrap();
    for i in 0..8 {
        let part = graph.part_in_slot(&format!("leg_{}", i)).unwrap();
        let expected = if i % 2 == 0 { "long_leg" } else { "short_leg" };
        assert_eq!(part.definition.as_deref(), Some(expected));
    }
}

#[test]
fn test_excess_matches_fail_integrity() {
    let mut registry = AnatomyRegistry::new();
    registry.register_template(template(SPIDER_TEMPLATE));
    registry.register_blueprint(blueprint(SPIDER_BLUEPRINT));
    registry.register_recipe(recipe(
        r#"
id = "six_legs"
[[bindings]]
pattern = { group = "legs" }
parts = [
  { part_type = "leg" }, { part_type = "leg" }, { part_type = "leg" },
  { part_type = "leg" }, { part_type = "leg" }, { part_type = "leg" },
]
"#,
    ));
    registry.register_part(PartDefinition {
        id: "spider_leg".into(),
        part_type: "leg".into(),
        tags: vec![],
    });

    let err = AnatomyGenerator::new(&registry)
        .generate("spider", "six_legs")
        .unwrap_err();
    let report = err.report().expect("integrity report");
    assert_eq!(report.stage, Stage::Integrity);
    assert_eq!(report.errors.len(), 2);
    assert!(report.errors.iter().all(|f| f.subject == "slot 'leg_6'" || f.subject == "slot 'leg_7'"));
}

#[test]
fn test_nested_limb_sets_attach_to_parent_parts() {
    let tpl = template(
        r#"
id = "insectoid"

[[limb_sets]]
name = "head"
socket_pattern = "head"
part_type = "head"

[[appendages]]
name = "antennae"
count = 2
socket_pattern = "antenna_{n}"
part_type = "antenna"
parent = "head"
"#,
    );
    let bp = blueprint(
        r#"
id = "beetle"
schema_version = 2
root = "thorax"
structure_template = "insectoid"
"#,
    );
    let skeleton = SlotGraphBuilder::default().build(&bp, Some(&tpl)).unwrap();
    let r = recipe(
        r#"
id = "stag_beetle"
[[bindings]]
pattern = { group = "antennae" }
part = { part_type = "antenna" }

[[bindings]]
slot = "head"
part = { part_type = "head" }
"#,
    );
    let graph = RecipeApplier::default().apply(&r, &skeleton).unwrap();
    let head = graph.part_in_slot("head").unwrap();
    assert_eq!(graph.children_of(head.id).count(), 2);
    assert!(IntegrityValidator::default().validate(&graph).is_valid());
}
