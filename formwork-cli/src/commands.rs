//! Command implementations. Each returns the JSON document to print and
//! whether the command found problems.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use formwork::{FieldValues, FormDefinition, FormEngine, FormInstance};
use formwork_fields::{
    create_instance_from_definition, instance_from_value, upgrade_instance, UnknownKeyPolicy,
};
use formwork_units::{convert, Dimension};
use formwork_visibility::DependencyGraph;
use serde_json::{json, Value};
use tracing::debug;

/// The document a command prints, and whether it reported problems.
#[derive(Debug, PartialEq)]
pub struct Report {
    pub output: Value,
    pub clean: bool,
}

impl Report {
    fn clean(output: Value) -> Self {
        Self {
            output,
            clean: true,
        }
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn read_definition(engine: &FormEngine, path: &Path) -> Result<FormDefinition> {
    let json = read(path)?;
    engine
        .load_definition(&json)
        .with_context(|| format!("loading definition {}", path.display()))
}

/// Accept a full instance document or a bare object of field values.
fn read_instance(path: &Path, definition: &FormDefinition) -> Result<FormInstance> {
    let raw: Value = serde_json::from_str(&read(path)?)
        .with_context(|| format!("parsing {}", path.display()))?;
    let is_instance = raw
        .as_object()
        .is_some_and(|doc| doc.contains_key("definition") && doc.contains_key("values"));
    if is_instance {
        return instance_from_value(raw)
            .with_context(|| format!("loading instance {}", path.display()));
    }
    let values: FieldValues = serde_json::from_value(raw)
        .with_context(|| format!("{} is neither an instance nor an object of values", path.display()))?;
    debug!(path = %path.display(), "treating file as bare values");
    Ok(FormInstance::new(
        "values",
        &definition.name,
        &definition.version,
        values,
    ))
}

pub fn check(engine: &FormEngine, definition: &Path) -> Result<Report> {
    let definition = read_definition(engine, definition)?;
    let graph = DependencyGraph::build(&definition);
    let roots: Vec<&str> = graph
        .ids()
        .filter(|id| graph.is_root(*id))
        .map(|id| graph.name(id))
        .collect();
    let fields: Vec<Value> = definition
        .properties()
        .iter()
        .map(|field| {
            json!({
                "name": field.name,
                "type": field.field_type.as_str(),
                "required": field.required,
                "parents": field.parents.keys().collect::<Vec<_>>(),
            })
        })
        .collect();
    Ok(Report::clean(json!({
        "name": definition.name,
        "version": definition.version,
        "fields": fields,
        "roots": roots,
    })))
}

pub fn instance(engine: &FormEngine, definition: &Path, name: &str) -> Result<Report> {
    let definition = read_definition(engine, definition)?;
    let instance = create_instance_from_definition(&definition, name);
    Ok(Report::clean(serde_json::to_value(instance)?))
}

pub fn migrate(
    engine: &FormEngine,
    instance: &Path,
    definition: &Path,
    strict: bool,
    preserve_unknown: bool,
) -> Result<Report> {
    let definition = read_definition(engine, definition)?;
    let old = read_instance(instance, &definition)?;

    let mut options = engine.migration_options();
    if strict {
        options = options.with_strict(true);
    }
    if preserve_unknown {
        options = options.with_unknown_keys(UnknownKeyPolicy::Preserve);
    }
    let upgraded = upgrade_instance(&old, &definition, &options, None)
        .with_context(|| format!("migrating {} to version {}", old.name, definition.version))?;
    Ok(Report::clean(serde_json::to_value(upgraded.as_ref())?))
}

pub fn visibility(engine: &FormEngine, definition: &Path, values: &Path) -> Result<Report> {
    let definition = Arc::new(read_definition(engine, definition)?);
    let instance = read_instance(values, &definition)?;
    let session = engine.resume_session(definition, &instance, None)?;
    Ok(Report::clean(json!({
        "visible": session.visible_fields(),
        "visibility": session.visibility(),
    })))
}

/// Field and form validation. Problems from either make the report unclean.
pub async fn validate(engine: &FormEngine, definition: &Path, values: &Path) -> Result<Report> {
    let definition = Arc::new(read_definition(engine, definition)?);
    let instance = read_instance(values, &definition)?;
    let mut session = engine.resume_session(definition, &instance, None)?;
    let errors = session.validate().clone();
    let form_errors = session.validate_form().await.unwrap_or_default();
    let valid = errors.is_empty() && form_errors.is_empty();
    Ok(Report {
        clean: valid,
        output: json!({ "valid": valid, "errors": errors, "formErrors": form_errors }),
    })
}

pub fn convert_value(value: f64, from: &str, to: &str, dimension: Dimension) -> Result<Report> {
    let converted = convert(value, from, to, dimension)?;
    Ok(Report::clean(json!({
        "dimension": dimension,
        "from": { "value": value, "unit": from },
        "to": { "value": converted, "unit": to },
    })))
}
