//! Moving an instance to a new definition version.
//!
//! Values whose shape already fits the new field type are copied verbatim.
//! Anything else goes through a coercion table that is heuristic and lossy:
//! it guesses (`"abc"` becomes `0` for a number field), and the guesses are
//! not symmetric (`true` becomes `"true"`, while `"yes"`, `"on"`, `"1"` and
//! `"y"` all become `true`). Hosts that need exact behaviour either set
//! [`MigrationOptions::strict`], which turns every guess into a
//! [`MigrationError::Coercion`], or register an explicit converter for the
//! field.

use crate::error::MigrationError;
use crate::types::{FieldDefinition, FormDefinition, FormInstance, ValueShape};
use formwork_common::{loose_number, loose_string, FieldValues, Pretty, DEFAULT_ARRAY_DELIMITER};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// String tokens read as `true`. Anything else is `false`.
pub const TRUTHY_TOKENS: [&str; 5] = ["true", "1", "yes", "on", "y"];

const FALSY_TOKENS: [&str; 6] = ["false", "0", "no", "off", "n", ""];

/// What happens to values whose key no longer exists in the new definition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownKeyPolicy {
    #[default]
    Drop,
    Preserve,
}

/// Explicit conversion of one field's old value.
pub type ValueConverter = Arc<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>;

/// Error type a migration hook may return.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Post-processing over migrated values. Receives the old instance for context.
pub type MigrationHook<'h> =
    &'h dyn Fn(&mut FieldValues, &FormInstance) -> Result<(), HookError>;

/// Options for [`upgrade_instance`].
#[derive(Clone)]
pub struct MigrationOptions {
    pub unknown_keys: UnknownKeyPolicy,
    /// Refuse lossy guesses instead of applying fallbacks.
    pub strict: bool,
    /// Separator used when splitting strings into arrays and joining back.
    pub array_delimiter: String,
    converters: HashMap<String, ValueConverter>,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            unknown_keys: UnknownKeyPolicy::Drop,
            strict: false,
            array_delimiter: DEFAULT_ARRAY_DELIMITER.to_string(),
            converters: HashMap::new(),
        }
    }
}

impl fmt::Debug for MigrationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut converters: Vec<&String> = self.converters.keys().collect();
        converters.sort();
        f.debug_struct("MigrationOptions")
            .field("unknown_keys", &self.unknown_keys)
            .field("strict", &self.strict)
            .field("array_delimiter", &self.array_delimiter)
            .field("converters", &converters)
            .finish()
    }
}

impl MigrationOptions {
    pub fn with_unknown_keys(mut self, policy: UnknownKeyPolicy) -> Self {
        self.unknown_keys = policy;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// An empty delimiter is ignored.
    pub fn with_array_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        let delimiter = delimiter.into();
        if delimiter.is_empty() {
            warn!(kept = %self.array_delimiter, "ignoring empty array delimiter");
        } else {
            self.array_delimiter = delimiter;
        }
        self
    }

    /// Convert `field` with `converter` instead of the coercion table.
    pub fn with_converter<F>(mut self, field: impl Into<String>, converter: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.converters.insert(field.into(), Arc::new(converter));
        self
    }
}

/// Migrate `old` to `definition`.
///
/// Returns the old instance untouched when it already belongs to this
/// definition version. `hook` runs last over the migrated values; an error or
/// panic from it aborts the migration.
pub fn upgrade_instance<'a>(
    old: &'a FormInstance,
    definition: &FormDefinition,
    options: &MigrationOptions,
    hook: Option<MigrationHook<'_>>,
) -> Result<Cow<'a, FormInstance>, MigrationError> {
    if old.matches(definition) {
        trace!(instance = %old.name, "instance already at definition version");
        return Ok(Cow::Borrowed(old));
    }

    let mut values = FieldValues::new();
    for (key, value) in &old.values {
        match definition.field(key) {
            Some(field) => {
                let migrated = migrate_value(field, value, options)?;
                values.insert(key.clone(), migrated);
            }
            None => match options.unknown_keys {
                UnknownKeyPolicy::Drop => {
                    debug!(field = %key, "dropping value with no field in new definition");
                }
                UnknownKeyPolicy::Preserve => {
                    values.insert(key.clone(), value.clone());
                }
            },
        }
    }

    for field in definition.properties() {
        values
            .entry(field.name.clone())
            .or_insert_with(|| field.initial_value());
    }

    if let Some(hook) = hook {
        let outcome = catch_unwind(AssertUnwindSafe(|| hook(&mut values, old)));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(MigrationError::Hook {
                    message: e.to_string(),
                })
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                warn!(instance = %old.name, %message, "migration hook panicked");
                return Err(MigrationError::Hook { message });
            }
        }
    }

    debug!(
        instance = %old.name,
        from = %format!("{}@{}", old.definition, old.version),
        to = %format!("{}@{}", definition.name, definition.version),
        "migrated instance: {}",
        Pretty(&values)
    );
    Ok(Cow::Owned(FormInstance::new(
        old.name.clone(),
        definition.name.clone(),
        definition.version.clone(),
        values,
    )))
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

fn migrate_value(
    field: &FieldDefinition,
    value: &Value,
    options: &MigrationOptions,
) -> Result<Value, MigrationError> {
    if let Some(converter) = options.converters.get(&field.name) {
        return converter(value).map_err(|reason| MigrationError::Coercion {
            field: field.name.clone(),
            expected: field.field_type.to_string(),
            reason,
        });
    }

    match coerce(field, value, &options.array_delimiter) {
        Coerced::Exact(v) => Ok(v),
        Coerced::Lossy(v) if !options.strict => {
            trace!(field = %field.name, from = %value, to = %v, "applied fallback coercion");
            Ok(v)
        }
        Coerced::Lossy(_) => Err(MigrationError::Coercion {
            field: field.name.clone(),
            expected: field.field_type.to_string(),
            reason: format!("{value} has no exact conversion"),
        }),
    }
}

/// Result of the coercion table.
#[derive(Debug, PartialEq)]
enum Coerced {
    /// Value fits or converts without guessing.
    Exact(Value),
    /// A fallback was applied.
    Lossy(Value),
}

impl Coerced {
    fn map(self, f: impl FnOnce(Value) -> Value) -> Self {
        match self {
            Coerced::Exact(v) => Coerced::Exact(f(v)),
            Coerced::Lossy(v) => Coerced::Lossy(f(v)),
        }
    }
}

/// JSON number, integral when the value is integral.
pub fn number_value(n: f64) -> Value {
    const MAX_SAFE: f64 = 9_007_199_254_740_992.0;
    if n.fract() == 0.0 && n.abs() < MAX_SAFE {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn is_unit_tuple(value: &Value) -> bool {
    matches!(value, Value::Array(items)
        if items.len() == 2
            && (items[0].is_number() || items[0].is_null())
            && items[1].is_string())
}

fn split(s: &str, delimiter: &str) -> Vec<String> {
    s.split(delimiter)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn to_number(value: &Value) -> Coerced {
    match value {
        Value::Number(_) => Coerced::Exact(value.clone()),
        Value::Bool(b) => Coerced::Exact(Value::from(u8::from(*b))),
        Value::String(_) => match loose_number(value) {
            Some(n) => Coerced::Exact(number_value(n)),
            None => Coerced::Lossy(Value::from(0)),
        },
        Value::Array(items) if is_unit_tuple(value) => match &items[0] {
            Value::Null => Coerced::Lossy(Value::from(0)),
            magnitude => Coerced::Exact(magnitude.clone()),
        },
        _ => Coerced::Lossy(Value::from(0)),
    }
}

fn to_boolean(value: &Value) -> Coerced {
    match value {
        Value::Bool(_) => Coerced::Exact(value.clone()),
        Value::Number(n) => Coerced::Exact(Value::Bool(n.as_f64().is_some_and(|n| n != 0.0))),
        Value::String(s) => {
            let token = s.trim().to_lowercase();
            if TRUTHY_TOKENS.contains(&token.as_str()) {
                Coerced::Exact(Value::Bool(true))
            } else if FALSY_TOKENS.contains(&token.as_str()) {
                Coerced::Exact(Value::Bool(false))
            } else {
                Coerced::Lossy(Value::Bool(false))
            }
        }
        Value::Array(items) => Coerced::Lossy(Value::Bool(!items.is_empty())),
        _ => Coerced::Lossy(Value::Bool(false)),
    }
}

fn to_string(value: &Value, delimiter: &str) -> Coerced {
    match value {
        Value::String(_) => Coerced::Exact(value.clone()),
        Value::Number(_) | Value::Bool(_) => {
            Coerced::Exact(Value::String(loose_string(value).unwrap_or_default()))
        }
        Value::Array(items) if is_unit_tuple(value) => match &items[0] {
            Value::Null => Coerced::Exact(Value::String(String::new())),
            magnitude => Coerced::Exact(Value::String(loose_string(magnitude).unwrap_or_default())),
        },
        Value::Array(items) => Coerced::Exact(Value::String(
            items
                .iter()
                .filter_map(loose_string)
                .collect::<Vec<_>>()
                .join(delimiter),
        )),
        _ => Coerced::Lossy(Value::String(String::new())),
    }
}

fn to_string_array(value: &Value, delimiter: &str) -> Coerced {
    match value {
        Value::Array(items) => {
            let strings: Vec<Value> = items
                .iter()
                .filter_map(loose_string)
                .map(Value::String)
                .collect();
            if items.iter().all(|item| item.is_string()) {
                Coerced::Exact(value.clone())
            } else if items.iter().any(|item| item.is_object() || item.is_array()) {
                Coerced::Lossy(Value::Array(strings))
            } else {
                Coerced::Exact(Value::Array(strings))
            }
        }
        Value::String(s) => Coerced::Exact(Value::Array(
            split(s, delimiter).into_iter().map(Value::String).collect(),
        )),
        Value::Number(_) | Value::Bool(_) => Coerced::Exact(Value::Array(vec![Value::String(
            loose_string(value).unwrap_or_default(),
        )])),
        _ => Coerced::Lossy(Value::Array(Vec::new())),
    }
}

fn to_number_array(value: &Value, delimiter: &str) -> Coerced {
    let elements: Vec<Value> = match value {
        Value::Array(items) => items.clone(),
        Value::String(s) => split(s, delimiter).into_iter().map(Value::String).collect(),
        Value::Number(_) | Value::Bool(_) => vec![value.clone()],
        _ => return Coerced::Lossy(Value::Array(Vec::new())),
    };

    let mut lossy = false;
    let numbers: Vec<Value> = elements
        .iter()
        .map(|element| match to_number(element) {
            Coerced::Exact(v) => v,
            Coerced::Lossy(v) => {
                lossy = true;
                v
            }
        })
        .collect();
    if lossy {
        Coerced::Lossy(Value::Array(numbers))
    } else {
        Coerced::Exact(Value::Array(numbers))
    }
}

fn to_unit(field: &FieldDefinition, value: &Value) -> Coerced {
    if is_unit_tuple(value) {
        return Coerced::Exact(value.clone());
    }
    let unit = field
        .default_unit
        .clone()
        .map(Value::String)
        .unwrap_or(Value::Null);
    match value {
        Value::String(s) if s.trim().is_empty() => {
            Coerced::Exact(Value::Array(vec![Value::Null, unit]))
        }
        Value::Number(_) | Value::String(_) => {
            to_number(value).map(|n| Value::Array(vec![n, unit.clone()]))
        }
        _ => Coerced::Lossy(Value::Array(vec![Value::Null, unit])),
    }
}

/// Coerce `value` into the shape `field` expects.
fn coerce(field: &FieldDefinition, value: &Value, delimiter: &str) -> Coerced {
    if value.is_null() {
        return Coerced::Exact(Value::Null);
    }
    match field.field_type.shape() {
        ValueShape::Any => Coerced::Exact(value.clone()),
        ValueShape::Boolean => to_boolean(value),
        ValueShape::Number => to_number(value),
        ValueShape::String => to_string(value, delimiter),
        ValueShape::StringArray => to_string_array(value, delimiter),
        ValueShape::NumberArray => to_number_array(value, delimiter),
        ValueShape::UnitTuple => to_unit(field, value),
        ValueShape::File => match value {
            Value::Object(_) => Coerced::Exact(value.clone()),
            _ => Coerced::Lossy(Value::Null),
        },
    }
}
