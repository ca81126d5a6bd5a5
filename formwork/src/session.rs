//! FormSession: the live state of one form being filled in.
//!
//! A session owns the instance values and keeps the visibility and error
//! maps in step with them. Each [`set_value`](FormSession::set_value)
//! updates visibility incrementally and re-validates only the changed field.

use crate::engine::FormEngine;
use crate::error::{FormworkError, Result};
use formwork_fields::{
    FieldDefinition, FieldType, FieldValues, FormDefinition, FormInstance, ValidationErrorMap,
    VisibilityMap,
};
use formwork_submit::{SubmitHandler, SubmitOutcome, SubmitRequest};
use formwork_units::convert;
use formwork_visibility::{initial_visibility, on_field_changed, visible_fields, DependencyGraph};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace};

/// What a single value change did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldChange {
    /// Fields that became visible, in definition order.
    pub shown: Vec<String>,
    /// Fields that became hidden, in definition order.
    pub hidden: Vec<String>,
    /// The changed field's validation message, if any.
    pub error: Option<String>,
}

pub struct FormSession<'e> {
    engine: &'e FormEngine,
    definition: Arc<FormDefinition>,
    graph: DependencyGraph,
    instance: FormInstance,
    visibility: VisibilityMap,
    errors: ValidationErrorMap,
}

impl<'e> FormSession<'e> {
    pub(crate) fn new(
        engine: &'e FormEngine,
        definition: Arc<FormDefinition>,
        instance: FormInstance,
    ) -> Self {
        let graph = DependencyGraph::build(&definition);
        let visibility = initial_visibility(&graph, &instance.values);
        debug!(
            definition = %definition.name,
            instance = %instance.name,
            visible = visibility.values().filter(|v| **v).count(),
            "opened form session"
        );
        Self {
            engine,
            definition,
            graph,
            instance,
            visibility,
            errors: ValidationErrorMap::new(),
        }
    }

    pub fn definition(&self) -> &FormDefinition {
        &self.definition
    }

    pub fn instance(&self) -> &FormInstance {
        &self.instance
    }

    pub fn into_instance(self) -> FormInstance {
        self.instance
    }

    pub fn values(&self) -> &FieldValues {
        &self.instance.values
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.instance.values.get(name)
    }

    pub fn visibility(&self) -> &VisibilityMap {
        &self.visibility
    }

    pub fn is_visible(&self, name: &str) -> bool {
        self.visibility.get(name).copied().unwrap_or(false)
    }

    /// Visible field names in definition order.
    pub fn visible_fields(&self) -> Vec<String> {
        visible_fields(&self.graph, &self.visibility)
    }

    /// Every field shown or hidden together with `name`.
    pub fn descendants(&self, name: &str) -> Vec<String> {
        self.graph.descendants(name)
    }

    pub fn errors(&self) -> &ValidationErrorMap {
        &self.errors
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }

    fn field(&self, name: &str) -> Result<&FieldDefinition> {
        self.definition
            .field(name)
            .ok_or_else(|| FormworkError::UnknownField {
                name: name.to_string(),
            })
    }

    /// Store a new value, update visibility and re-validate the field.
    ///
    /// Errors of fields that became hidden are dropped; fields that became
    /// visible are not validated until they change or [`validate`] runs.
    ///
    /// [`validate`]: FormSession::validate
    pub fn set_value(&mut self, name: &str, value: Value) -> Result<FieldChange> {
        let field = self.field(name)?.clone();

        let visibility = on_field_changed(
            &self.graph,
            name,
            &value,
            &self.instance.values,
            &self.visibility,
        );
        let mut change = FieldChange::default();
        for other in self.definition.properties() {
            let before = self.is_visible(&other.name);
            let after = visibility.get(&other.name).copied().unwrap_or(false);
            if !before && after {
                change.shown.push(other.name.clone());
            } else if before && !after {
                change.hidden.push(other.name.clone());
                self.errors.remove(&other.name);
            }
        }
        self.visibility = visibility;

        change.error = if self.is_visible(name) {
            self.engine.validators().validate_field(
                &self.definition.name,
                &field,
                &value,
                self.engine.translate(),
            )
        } else {
            None
        };
        match &change.error {
            Some(message) => self.errors.insert(name.to_string(), message.clone()),
            None => self.errors.remove(name),
        };
        self.instance.values.insert(name.to_string(), value);

        trace!(field = name, ?change, "value changed");
        Ok(change)
    }

    /// Validate every visible field, replacing the error map.
    pub fn validate(&mut self) -> &ValidationErrorMap {
        self.errors = self.engine.validators().validate_all(
            &self.definition,
            &self.instance.values,
            &self.visibility,
            self.engine.translate(),
        );
        &self.errors
    }

    /// Run the definition's form validator over the current values.
    pub async fn validate_form(&self) -> Option<Vec<String>> {
        self.engine
            .validators()
            .validate_form(&self.definition, &self.instance.values, self.engine.translate())
            .await
    }

    /// Convert a unit field's value to another unit of its dimension.
    ///
    /// A missing magnitude just switches the unit.
    pub fn convert_unit(&mut self, name: &str, to_unit: &str) -> Result<FieldChange> {
        let field = self.field(name)?;
        if field.field_type != FieldType::Unit {
            return Err(FormworkError::NotAUnitField {
                name: name.to_string(),
            });
        }
        let dimension = field
            .unit_dimension()
            .ok_or_else(|| FormworkError::MissingDimension {
                name: name.to_string(),
            })?;

        let current = self.value(name).cloned().unwrap_or(Value::Null);
        let (magnitude, from_unit) = match &current {
            Value::Array(parts) if parts.len() == 2 => (
                parts[0].as_f64(),
                parts[1].as_str().map(str::to_string),
            ),
            _ => (None, None),
        };
        let from_unit = from_unit
            .or_else(|| field.default_unit.clone())
            .unwrap_or_else(|| dimension.base_unit().to_string());

        let converted = match magnitude {
            Some(m) => Value::from(convert(m, &from_unit, to_unit, dimension)?),
            None => {
                if !dimension.has_unit(to_unit) {
                    return Err(formwork_units::UnitError::UnknownUnit {
                        unit: to_unit.to_string(),
                        dimension,
                    }
                    .into());
                }
                Value::Null
            }
        };
        self.set_value(name, Value::Array(vec![converted, Value::String(to_unit.to_string())]))
    }

    /// Submit the current values. `handler` replaces the definition's named
    /// handler for this call. Current field errors block the submission.
    pub async fn submit(&self, handler: Option<&dyn SubmitHandler>) -> SubmitOutcome {
        let mut request = SubmitRequest::new(
            &self.definition,
            &self.instance,
            &self.instance.values,
            self.engine.translate(),
        )
        .with_existing_errors(self.errors.clone());
        if let Some(handler) = handler {
            request = request.with_handler(handler);
        }
        self.engine.submitter().submit(request).await
    }
}

impl std::fmt::Debug for FormSession<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormSession")
            .field("definition", &self.definition.name)
            .field("instance", &self.instance)
            .field("visibility", &self.visibility)
            .field("errors", &self.errors)
            .finish()
    }
}
