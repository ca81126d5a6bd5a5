//! Loading definitions from JSON.
//!
//! Loading parses the document, checks every structural rule and collects all
//! violations before deciding. Only a document with no violations becomes a
//! [`FormDefinition`]; derived `children` are then rebuilt from `parents` and
//! the cycle policy is applied.

use crate::error::{Result, SchemaError};
use crate::types::FormDefinition;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, warn};

/// What to do when parent references form a cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclePolicy {
    /// Refuse the definition with [`SchemaError::Cycle`].
    #[default]
    Reject,
    /// Keep the definition. Visibility still terminates on cyclic graphs.
    Permissive,
}

/// Options for [`load_definition_with`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub cycle_policy: CyclePolicy,
}

/// Parse and check a definition with default options.
pub fn load_definition(json: &str) -> Result<FormDefinition> {
    load_definition_with(json, &LoadOptions::default())
}

/// Parse and check a definition.
pub fn load_definition_with(json: &str, options: &LoadOptions) -> Result<FormDefinition> {
    let raw: Value = serde_json::from_str(json).map_err(|e| SchemaError::Parse {
        document: "definition",
        message: e.to_string(),
    })?;
    definition_from_value(raw, options)
}

/// Check and convert an already parsed JSON document.
pub fn definition_from_value(raw: Value, options: &LoadOptions) -> Result<FormDefinition> {
    let violations = definition_violations(&raw);
    if !violations.is_empty() {
        return Err(SchemaError::Invalid {
            document: "definition",
            violations,
        });
    }

    let mut definition: FormDefinition =
        serde_json::from_value(raw).map_err(|e| SchemaError::Parse {
            document: "definition",
            message: e.to_string(),
        })?;
    definition.finalize();

    let cycle = find_cycle(&definition);
    if !cycle.is_empty() {
        match options.cycle_policy {
            CyclePolicy::Reject => return Err(SchemaError::Cycle { fields: cycle }),
            CyclePolicy::Permissive => {
                warn!(definition = %definition.name, fields = ?cycle, "definition has a dependency cycle");
            }
        }
    }

    debug!(
        definition = %definition.name,
        version = %definition.version,
        fields = definition.len(),
        "loaded definition"
    );
    Ok(definition)
}

fn non_empty_string(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::String(s)) if !s.trim().is_empty())
}

/// Every structural rule the raw document breaks.
fn definition_violations(raw: &Value) -> Vec<String> {
    let mut violations = Vec::new();
    let Some(doc) = raw.as_object() else {
        violations.push("definition must be a JSON object".to_string());
        return violations;
    };

    for key in ["name", "version"] {
        if !non_empty_string(doc.get(key)) {
            violations.push(format!("'{key}' must be a non-empty string"));
        }
    }

    let properties = match doc.get("properties") {
        None | Some(Value::Null) => {
            violations.push("'properties' is missing".to_string());
            return violations;
        }
        Some(Value::Array(items)) => items,
        Some(_) => {
            violations.push("'properties' must be an array".to_string());
            return violations;
        }
    };

    let mut seen = HashSet::new();
    for (i, property) in properties.iter().enumerate() {
        let Some(field) = property.as_object() else {
            violations.push(format!("property {i} must be an object"));
            continue;
        };
        if !non_empty_string(field.get("name")) {
            violations.push(format!("property {i}: 'name' must be a non-empty string"));
        } else if let Some(Value::String(name)) = field.get("name") {
            if !seen.insert(name.as_str()) {
                violations.push(format!("property {i}: duplicate field name '{name}'"));
            }
        }
        if !non_empty_string(field.get("type")) {
            violations.push(format!("property {i}: 'type' must be a non-empty string"));
        }
        if let Some(parents) = field.get("parents") {
            if !(parents.is_object() || parents.is_null()) {
                violations.push(format!("property {i}: 'parents' must be an object"));
            }
        }
    }
    violations
}

/// Fields that sit on a parent/child cycle, in definition order.
///
/// Peels off nodes with no incoming edges, then nodes with no outgoing edges;
/// whatever survives both passes lies on or between cycles.
pub fn find_cycle(definition: &FormDefinition) -> Vec<String> {
    let fields = definition.properties();
    let mut outgoing: Vec<HashSet<usize>> = vec![HashSet::new(); fields.len()];
    let mut incoming: Vec<HashSet<usize>> = vec![HashSet::new(); fields.len()];
    for (child, field) in fields.iter().enumerate() {
        for parent in field.parents.keys() {
            if let Some(p) = definition.position(parent) {
                outgoing[p].insert(child);
                incoming[child].insert(p);
            }
        }
    }

    let mut alive: Vec<bool> = vec![true; fields.len()];
    peel(&mut alive, &incoming, &outgoing);
    peel(&mut alive, &outgoing, &incoming);

    fields
        .iter()
        .zip(alive)
        .filter(|(_, alive)| *alive)
        .map(|(f, _)| f.name.clone())
        .collect()
}

/// Repeatedly remove live nodes whose `edges_in` are all dead.
fn peel(alive: &mut [bool], edges_in: &[HashSet<usize>], edges_out: &[HashSet<usize>]) {
    let mut remaining: HashMap<usize, usize> = (0..alive.len())
        .filter(|&i| alive[i])
        .map(|i| (i, edges_in[i].iter().filter(|&&j| alive[j]).count()))
        .collect();
    let mut queue: VecDeque<usize> = remaining
        .iter()
        .filter(|&(_, &count)| count == 0)
        .map(|(&i, _)| i)
        .collect();

    while let Some(node) = queue.pop_front() {
        alive[node] = false;
        for &next in &edges_out[node] {
            if let Some(count) = remaining.get_mut(&next) {
                if *count > 0 {
                    *count -= 1;
                    if *count == 0 && alive[next] {
                        queue.push_back(next);
                    }
                }
            }
        }
    }
}
