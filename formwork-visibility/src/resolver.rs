//! Visibility resolution.
//!
//! A field is visible when it is a root, or when at least one of its parents
//! is visible and that parent's value produces a trigger key in the edge's
//! trigger set. Trigger keys come from [`formwork_common::trigger_keys`]:
//! scalars stringify, arrays contribute every non-null element, `null` and
//! missing values contribute nothing.
//!
//! The result is the smallest map satisfying that rule, which is what a
//! descent from the roots produces. All walks are iterative worklists and
//! visit each node at most once per pass, so cyclic graphs terminate.

use crate::graph::{DependencyGraph, FieldId};
use formwork_common::{trigger_keys, FieldValues};
use formwork_fields::VisibilityMap;
use serde_json::Value;
use tracing::trace;

/// Read access to the current value of each node.
trait Values {
    fn value_of(&self, graph: &DependencyGraph, id: FieldId) -> Option<&Value>;
}

impl Values for FieldValues {
    fn value_of(&self, graph: &DependencyGraph, id: FieldId) -> Option<&Value> {
        self.get(graph.name(id))
    }
}

/// `values` with one field replaced.
struct Overlay<'a> {
    values: &'a FieldValues,
    changed: FieldId,
    value: &'a Value,
}

impl Values for Overlay<'_> {
    fn value_of(&self, graph: &DependencyGraph, id: FieldId) -> Option<&Value> {
        if id == self.changed {
            Some(self.value)
        } else {
            self.values.get(graph.name(id))
        }
    }
}

fn keys_of(graph: &DependencyGraph, values: &impl Values, id: FieldId) -> Vec<String> {
    values
        .value_of(graph, id)
        .map(trigger_keys)
        .unwrap_or_default()
}

/// Mark `start` visible and descend through matching children.
fn show_cascade(
    graph: &DependencyGraph,
    values: &impl Values,
    visible: &mut [bool],
    start: impl IntoIterator<Item = FieldId>,
) {
    let mut worklist: Vec<FieldId> = Vec::new();
    for id in start {
        if !visible[id.index()] {
            visible[id.index()] = true;
            worklist.push(id);
        }
    }
    while let Some(id) = worklist.pop() {
        for key in keys_of(graph, values, id) {
            for &child in graph.children_for(id, &key) {
                if !visible[child.index()] {
                    trace!(parent = graph.name(id), child = graph.name(child), %key, "show");
                    visible[child.index()] = true;
                    worklist.push(child);
                }
            }
        }
    }
}

/// Whether any parent edge of `id` is satisfied.
fn satisfied(graph: &DependencyGraph, values: &impl Values, visible: &[bool], id: FieldId) -> bool {
    graph.parents(id).iter().any(|edge| {
        visible[edge.parent.index()]
            && keys_of(graph, values, edge.parent)
                .iter()
                .any(|key| edge.triggers.contains(key))
    })
}

fn to_map(graph: &DependencyGraph, visible: &[bool]) -> VisibilityMap {
    graph
        .ids()
        .map(|id| (graph.name(id).to_string(), visible[id.index()]))
        .collect()
}

/// Visibility of every field from scratch.
pub fn initial_visibility(graph: &DependencyGraph, values: &FieldValues) -> VisibilityMap {
    let mut visible = vec![false; graph.len()];
    let roots: Vec<FieldId> = graph.ids().filter(|&id| graph.is_root(id)).collect();
    show_cascade(graph, values, &mut visible, roots);
    to_map(graph, &visible)
}

/// Update `previous` after `name` changed to `new_value`.
///
/// `values` may hold either the old or the new value for `name`; `new_value`
/// wins. Only the subtree below `name` is recomputed:
///
/// 1. every descendant is hidden,
/// 2. children matching the new value are shown and the show cascade
///    continues below them,
/// 3. every field depending on `name` and every node in the hidden subtree
///    is re-evaluated across all of its parents until nothing changes, so a
///    field kept visible by another parent reappears.
///
/// Given a `previous` map that was correct for the old values, the result
/// equals [`initial_visibility`] over the new values. An unknown `name`
/// returns `previous` unchanged.
pub fn on_field_changed(
    graph: &DependencyGraph,
    name: &str,
    new_value: &Value,
    values: &FieldValues,
    previous: &VisibilityMap,
) -> VisibilityMap {
    let Some(changed) = graph.id(name) else {
        trace!(field = name, "change to unknown field ignored");
        return previous.clone();
    };
    let overlay = Overlay {
        values,
        changed,
        value: new_value,
    };

    let mut visible: Vec<bool> = graph
        .ids()
        .map(|id| previous.get(graph.name(id)).copied().unwrap_or(false))
        .collect();

    let subtree = graph.descendant_ids(changed);
    for &id in &subtree {
        visible[id.index()] = false;
    }

    if visible[changed.index()] {
        let shown: Vec<FieldId> = keys_of(graph, &overlay, changed)
            .iter()
            .flat_map(|key| graph.children_for(changed, key).iter().copied())
            .collect();
        show_cascade(graph, &overlay, &mut visible, shown);
    }

    let mut candidates: Vec<FieldId> = graph.dependents(changed).to_vec();
    candidates.extend(subtree.iter().copied());
    candidates.sort();
    candidates.dedup();

    loop {
        let mut progressed = false;
        for &id in &candidates {
            if !visible[id.index()] && satisfied(graph, &overlay, &visible, id) {
                show_cascade(graph, &overlay, &mut visible, [id]);
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }

    to_map(graph, &visible)
}

/// Visible field names in definition order.
pub fn visible_fields(graph: &DependencyGraph, visibility: &VisibilityMap) -> Vec<String> {
    graph
        .ids()
        .map(|id| graph.name(id))
        .filter(|name| visibility.get(*name).copied().unwrap_or(false))
        .map(str::to_string)
        .collect()
}
