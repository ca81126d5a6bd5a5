//! # Formwork Visibility
//!
//! Decides which fields of a form are shown.
//!
//! Build a [`DependencyGraph`] once per definition, compute the starting map
//! with [`initial_visibility`], then feed each value change through
//! [`on_field_changed`], which only recomputes the subtree below the changed
//! field.
//!
//! ```
//! use formwork_fields::{FieldDefinition, FieldType, FormDefinition, FieldValues};
//! use formwork_visibility::{initial_visibility, on_field_changed, DependencyGraph};
//! use serde_json::json;
//!
//! let definition = FormDefinition::new("pets", "1", vec![
//!     FieldDefinition::new("hasPet", FieldType::Boolean),
//!     FieldDefinition::new("petName", FieldType::String).with_parent("hasPet", ["yes"]),
//! ]);
//! let graph = DependencyGraph::build(&definition);
//!
//! let mut values = FieldValues::new();
//! values.insert("hasPet".into(), json!("no"));
//! let map = initial_visibility(&graph, &values);
//! assert!(!map["petName"]);
//!
//! let map = on_field_changed(&graph, "hasPet", &json!("yes"), &values, &map);
//! assert!(map["petName"]);
//! ```

mod graph;
mod resolver;

pub use graph::{DependencyGraph, FieldId, ParentEdge};
pub use resolver::{initial_visibility, on_field_changed, visible_fields};
