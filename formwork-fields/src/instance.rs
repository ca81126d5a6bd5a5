//! Creating and loading instances.

use crate::error::{Result, SchemaError};
use crate::types::{FormDefinition, FormInstance};
use formwork_common::FieldValues;
use serde_json::Value;
use tracing::debug;

/// A fresh instance with every field at its initial value.
pub fn create_instance_from_definition(
    definition: &FormDefinition,
    name: impl Into<String>,
) -> FormInstance {
    let values: FieldValues = definition
        .properties()
        .iter()
        .map(|field| (field.name.clone(), field.initial_value()))
        .collect();
    let instance = FormInstance::new(name, &definition.name, &definition.version, values);
    debug!(
        instance = %instance.name,
        definition = %definition.name,
        "created instance from defaults"
    );
    instance
}

/// Parse and check an instance document.
pub fn load_instance(json: &str) -> Result<FormInstance> {
    let raw: Value = serde_json::from_str(json).map_err(|e| SchemaError::Parse {
        document: "instance",
        message: e.to_string(),
    })?;
    instance_from_value(raw)
}

/// Check and convert an already parsed instance document.
pub fn instance_from_value(raw: Value) -> Result<FormInstance> {
    let mut violations = Vec::new();
    match raw.as_object() {
        None => violations.push("instance must be a JSON object".to_string()),
        Some(doc) => {
            for key in ["name", "definition", "version"] {
                match doc.get(key) {
                    Some(Value::String(s)) if !s.trim().is_empty() => {}
                    _ => violations.push(format!("'{key}' must be a non-empty string")),
                }
            }
            if !matches!(doc.get("values"), Some(Value::Object(_))) {
                violations.push("'values' must be an object".to_string());
            }
        }
    }
    if !violations.is_empty() {
        return Err(SchemaError::Invalid {
            document: "instance",
            violations,
        });
    }

    serde_json::from_value(raw).map_err(|e| SchemaError::Parse {
        document: "instance",
        message: e.to_string(),
    })
}
