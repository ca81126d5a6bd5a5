//! Index-based dependency graph built once per definition.
//!
//! Every field becomes a node addressed by a dense [`FieldId`]. Parent edges
//! carry the trigger set for that edge; child edges are grouped by trigger
//! value. References to fields that do not exist are dropped while building,
//! so a field whose every parent dangles is a root.

use formwork_fields::FormDefinition;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt;

/// Dense node identifier. Ordering follows definition order.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldId(u32);

impl FieldId {
    #[inline]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldId({})", self.0)
    }
}

/// One parent → child edge seen from the child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentEdge {
    pub parent: FieldId,
    pub triggers: BTreeSet<String>,
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    parents: Vec<ParentEdge>,
    children: BTreeMap<String, Vec<FieldId>>,
    /// Every child regardless of trigger, deduplicated, in definition order.
    dependents: Vec<FieldId>,
}

/// Parent/child adjacency for one definition.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    nodes: Vec<Node>,
    index: HashMap<String, FieldId>,
}

impl DependencyGraph {
    pub fn build(definition: &FormDefinition) -> Self {
        let index: HashMap<String, FieldId> = definition
            .field_names()
            .enumerate()
            .map(|(i, name)| (name.to_string(), FieldId(i as u32)))
            .collect();

        let mut nodes: Vec<Node> = definition
            .properties()
            .iter()
            .map(|field| Node {
                name: field.name.clone(),
                parents: field
                    .parents
                    .iter()
                    .filter_map(|(parent, triggers)| {
                        index.get(parent).map(|&parent| ParentEdge {
                            parent,
                            triggers: triggers.clone(),
                        })
                    })
                    .collect(),
                children: BTreeMap::new(),
                dependents: Vec::new(),
            })
            .collect();

        for (i, field) in definition.properties().iter().enumerate() {
            let mut dependents: BTreeSet<FieldId> = BTreeSet::new();
            for (trigger, names) in &field.children {
                let ids: Vec<FieldId> = names.iter().filter_map(|n| index.get(n).copied()).collect();
                dependents.extend(ids.iter().copied());
                if !ids.is_empty() {
                    nodes[i].children.insert(trigger.clone(), ids);
                }
            }
            nodes[i].dependents = dependents.into_iter().collect();
        }

        Self { nodes, index }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn id(&self, name: &str) -> Option<FieldId> {
        self.index.get(name).copied()
    }

    pub fn name(&self, id: FieldId) -> &str {
        &self.nodes[id.index()].name
    }

    /// All ids in definition order.
    pub fn ids(&self) -> impl Iterator<Item = FieldId> + '_ {
        (0..self.nodes.len()).map(|i| FieldId(i as u32))
    }

    /// A root has no parent that exists in the definition.
    pub fn is_root(&self, id: FieldId) -> bool {
        self.nodes[id.index()].parents.is_empty()
    }

    pub fn parents(&self, id: FieldId) -> &[ParentEdge] {
        &self.nodes[id.index()].parents
    }

    /// Children shown when the field's value produces `trigger`.
    pub fn children_for(&self, id: FieldId, trigger: &str) -> &[FieldId] {
        self.nodes[id.index()]
            .children
            .get(trigger)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every direct child regardless of trigger.
    pub fn dependents(&self, id: FieldId) -> &[FieldId] {
        &self.nodes[id.index()].dependents
    }

    /// Every field reachable through child edges, excluding `id` itself
    /// unless it lies on a cycle. Ordered by definition order.
    pub fn descendant_ids(&self, id: FieldId) -> Vec<FieldId> {
        let mut seen = vec![false; self.nodes.len()];
        let mut queue: VecDeque<FieldId> = self.dependents(id).iter().copied().collect();
        while let Some(next) = queue.pop_front() {
            if seen[next.index()] {
                continue;
            }
            seen[next.index()] = true;
            queue.extend(self.dependents(next).iter().copied());
        }
        self.ids().filter(|i| seen[i.index()]).collect()
    }

    /// Names of every descendant of `name`. Unknown names have none.
    pub fn descendants(&self, name: &str) -> Vec<String> {
        self.id(name)
            .map(|id| {
                self.descendant_ids(id)
                    .into_iter()
                    .map(|d| self.name(d).to_string())
                    .collect()
            })
            .unwrap_or_default()
    }
}
