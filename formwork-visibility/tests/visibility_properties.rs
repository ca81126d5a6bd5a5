//! Property tests for visibility resolution.
//!
//! Definitions are generated with arbitrary parent references, including
//! self references, cycles and dangling names.

use formwork_common::trigger_keys;
use formwork_fields::{FieldDefinition, FieldType, FieldValues, FormDefinition, VisibilityMap};
use formwork_visibility::{initial_visibility, on_field_changed, DependencyGraph};
use proptest::prelude::*;
use serde_json::{json, Value};

const TRIGGERS: [&str; 3] = ["a", "b", "c"];

fn field_name(i: usize) -> String {
    format!("f{i}")
}

/// Field `i` gets parents from `edges`, each `(parent, trigger mask)`.
fn arb_definition() -> impl Strategy<Value = FormDefinition> {
    (1usize..8).prop_flat_map(|n| {
        prop::collection::vec(
            prop::collection::vec((0usize..n + 1, 1u8..8), 0..3),
            n,
        )
        .prop_map(move |parents| {
            let fields = parents
                .into_iter()
                .enumerate()
                .map(|(i, edges)| {
                    let mut field = FieldDefinition::new(field_name(i), FieldType::Select);
                    for (parent, mask) in edges {
                        // Index `n` names a field that does not exist.
                        let triggers: Vec<&str> = TRIGGERS
                            .iter()
                            .enumerate()
                            .filter(|(bit, _)| mask & (1 << bit) != 0)
                            .map(|(_, t)| *t)
                            .collect();
                        field = field.with_parent(field_name(parent), triggers);
                    }
                    field
                })
                .collect();
            FormDefinition::new("generated", "1", fields)
        })
    })
}

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(json!("a")),
        Just(json!("b")),
        Just(json!("c")),
        Just(json!("z")),
        Just(Value::Null),
        Just(json!(["a", "c"])),
        Just(json!(true)),
    ]
}

fn arb_case() -> impl Strategy<Value = (FormDefinition, FieldValues, usize, Value)> {
    arb_definition().prop_flat_map(|definition| {
        let n = definition.len();
        (
            Just(definition),
            prop::collection::vec(arb_value(), n),
            0..n,
            arb_value(),
        )
            .prop_map(|(definition, values, changed, new_value)| {
                let values: FieldValues = values
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| (field_name(i), v))
                    .collect();
                (definition, values, changed, new_value)
            })
    })
}

fn edge_satisfied(
    values: &FieldValues,
    map: &VisibilityMap,
    parent: &str,
    triggers: &std::collections::BTreeSet<String>,
) -> bool {
    map.get(parent).copied().unwrap_or(false)
        && values
            .get(parent)
            .map(trigger_keys)
            .unwrap_or_default()
            .iter()
            .any(|k| triggers.contains(k))
}

proptest! {
    #[test]
    fn parentless_fields_are_always_visible((definition, values, _, _) in arb_case()) {
        let graph = DependencyGraph::build(&definition);
        let map = initial_visibility(&graph, &values);
        for field in definition.properties() {
            let live_parents = field.parents.keys().filter(|p| definition.contains(p)).count();
            if live_parents == 0 {
                prop_assert!(map[&field.name], "{} should be visible", field.name);
            }
        }
    }

    #[test]
    fn visibility_is_or_across_parents((definition, values, _, _) in arb_case()) {
        let graph = DependencyGraph::build(&definition);
        let map = initial_visibility(&graph, &values);
        for field in definition.properties() {
            let live: Vec<_> = field
                .parents
                .iter()
                .filter(|(p, _)| definition.contains(p))
                .collect();
            if live.is_empty() {
                continue;
            }
            let expected = live
                .iter()
                .any(|(p, triggers)| edge_satisfied(&values, &map, p, triggers));
            prop_assert_eq!(map[&field.name], expected, "field {}", field.name);
        }
    }

    #[test]
    fn resolution_is_idempotent((definition, values, _, _) in arb_case()) {
        let graph = DependencyGraph::build(&definition);
        prop_assert_eq!(initial_visibility(&graph, &values), initial_visibility(&graph, &values));
    }

    #[test]
    fn incremental_update_matches_full_recompute(
        (definition, values, changed, new_value) in arb_case()
    ) {
        let graph = DependencyGraph::build(&definition);
        let before = initial_visibility(&graph, &values);
        let name = field_name(changed);

        let incremental = on_field_changed(&graph, &name, &new_value, &values, &before);

        let mut updated = values.clone();
        updated.insert(name, new_value);
        prop_assert_eq!(incremental, initial_visibility(&graph, &updated));
    }

    #[test]
    fn clearing_a_parent_hides_its_only_children((definition, values, changed, _) in arb_case()) {
        let graph = DependencyGraph::build(&definition);
        let before = initial_visibility(&graph, &values);
        let name = field_name(changed);

        let after = on_field_changed(&graph, &name, &Value::Null, &values, &before);
        for field in definition.properties() {
            let live: Vec<&String> = field
                .parents
                .keys()
                .filter(|p| definition.contains(p))
                .collect();
            if field.name != name && live.len() == 1 && *live[0] == name {
                prop_assert!(!after[&field.name], "{} should be hidden", field.name);
            }
        }
    }
}
