//! Built-in validation rules, one fixed validator per built-in field type.
//!
//! Rules never fail on bad input; they return the first problem as a message
//! phrased through the injected [`Translate`]. Empty values are handled by the
//! pipeline before any type rule runs, so rules here only see filled values.

use crate::validator::TypeValidator;
use chrono::NaiveDate;
use dashmap::DashMap;
use formwork_common::{
    format_number, loose_number, loose_string, tr, Translate, DEFAULT_ARRAY_DELIMITER,
};
use formwork_fields::{FieldDefinition, FieldType, TRUTHY_TOKENS};
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;
use tracing::{trace, warn};

const FALSE_TOKENS: [&str; 5] = ["false", "0", "no", "off", "n"];

/// Compiled patterns by source text. Invalid patterns are kept as `None` so
/// they are reported once.
pub(crate) type PatternCache = DashMap<String, Option<Regex>>;

/// The validator registered under every built-in type tag.
#[derive(Debug, Clone)]
pub struct BuiltinValidator {
    field_type: FieldType,
    array_delimiter: String,
    patterns: Arc<PatternCache>,
}

impl BuiltinValidator {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            array_delimiter: DEFAULT_ARRAY_DELIMITER.to_string(),
            patterns: Arc::default(),
        }
    }

    /// Separator for number lists entered as text. An empty delimiter is
    /// ignored.
    pub fn with_array_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        let delimiter = delimiter.into();
        if delimiter.is_empty() {
            warn!(field_type = %self.field_type, "ignoring empty array delimiter");
        } else {
            self.array_delimiter = delimiter;
        }
        self
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    pub fn array_delimiter(&self) -> &str {
        &self.array_delimiter
    }

    /// Shares one pattern cache across validators.
    pub(crate) fn with_pattern_cache(mut self, patterns: Arc<PatternCache>) -> Self {
        self.patterns = patterns;
        self
    }

    /// The compiled form of `pattern`, built on first use.
    fn regex(&self, pattern: &str, field: &str) -> Option<Regex> {
        if let Some(cached) = self.patterns.get(pattern) {
            return cached.value().clone();
        }
        let compiled = match Regex::new(pattern) {
            Ok(regex) => Some(regex),
            Err(e) => {
                warn!(field, pattern, error = %e, "ignoring invalid validation pattern");
                None
            }
        };
        trace!(pattern, valid = compiled.is_some(), "compiled validation pattern");
        self.patterns.insert(pattern.to_string(), compiled.clone());
        compiled
    }

    /// Length and pattern rules for one piece of text.
    fn check_text(
        &self,
        field: &FieldDefinition,
        text: &str,
        translate: &dyn Translate,
    ) -> Option<String> {
        let label = field.label();
        let len = text.chars().count();
        if let Some(min) = field.min_length {
            if len < min {
                return Some(tr!(translate, "{{1}} must be at least {{2}} characters", label, min));
            }
        }
        if let Some(max) = field.max_length {
            if len > max {
                return Some(tr!(translate, "{{1}} must be at most {{2}} characters", label, max));
            }
        }
        if let Some(pattern) = &field.pattern {
            if let Some(regex) = self.regex(pattern, &field.name) {
                if !regex.is_match(text) {
                    return Some(tr!(translate, "{{1}} has an invalid format", label));
                }
            }
        }
        None
    }

    fn validate_string(
        &self,
        field: &FieldDefinition,
        value: &Value,
        translate: &dyn Translate,
    ) -> Option<String> {
        match value {
            Value::String(s) => self.check_text(field, s, translate),
            _ => Some(tr!(translate, "{{1}} must be text", field.label())),
        }
    }

    fn validate_string_array(
        &self,
        field: &FieldDefinition,
        value: &Value,
        translate: &dyn Translate,
    ) -> Option<String> {
        let Value::Array(items) = value else {
            return Some(tr!(translate, "{{1}} must be a list", field.label()));
        };
        check_items(field, items.len(), translate).or_else(|| {
            items.iter().find_map(|item| match item {
                Value::String(s) => self.check_text(field, s, translate),
                _ => Some(tr!(translate, "{{1}} must contain only text", field.label())),
            })
        })
    }

    /// Elements of a number list. Delimited strings are read as lists, the
    /// way they arrive from a text input before submission.
    fn number_elements(&self, value: &Value) -> Option<Vec<Value>> {
        match value {
            Value::Array(items) => Some(items.clone()),
            Value::String(s) => Some(
                s.split(self.array_delimiter.as_str())
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(|part| Value::String(part.to_string()))
                    .collect(),
            ),
            _ => None,
        }
    }

    fn validate_number_array(
        &self,
        field: &FieldDefinition,
        value: &Value,
        translate: &dyn Translate,
    ) -> Option<String> {
        let Some(items) = self.number_elements(value) else {
            return Some(tr!(translate, "{{1}} must be a list", field.label()));
        };
        check_items(field, items.len(), translate).or_else(|| {
            items.iter().find_map(|item| match loose_number(item) {
                Some(n) => check_range(field, n, translate),
                None => Some(tr!(translate, "{{1}} must contain only numbers", field.label())),
            })
        })
    }

    #[cfg(test)]
    fn cached_patterns(&self) -> usize {
        self.patterns.len()
    }
}

impl TypeValidator for BuiltinValidator {
    fn validate(
        &self,
        field: &FieldDefinition,
        value: &Value,
        translate: &dyn Translate,
    ) -> Option<String> {
        let label = field.label();
        match self.field_type {
            FieldType::Boolean => validate_boolean(label, value, translate),
            FieldType::Number => validate_number(field, value, translate),
            FieldType::Integer => validate_integer(field, value, translate),
            FieldType::String | FieldType::Text => self.validate_string(field, value, translate),
            FieldType::Select => validate_select(field, value, translate),
            FieldType::MultiSelect => validate_multiselect(field, value, translate),
            FieldType::NumberArray => self.validate_number_array(field, value, translate),
            FieldType::StringArray => self.validate_string_array(field, value, translate),
            FieldType::Unit => validate_unit(field, value, translate),
            FieldType::File => validate_file(field, value, translate),
            FieldType::Date => validate_date(label, value, translate),
            FieldType::Custom(_) => None,
        }
    }
}

/// Message for a required field left empty.
pub fn required_message(field: &FieldDefinition, translate: &dyn Translate) -> String {
    tr!(translate, "{{1}} is required", field.label())
}

fn validate_boolean(label: &str, value: &Value, translate: &dyn Translate) -> Option<String> {
    let ok = match value {
        Value::Bool(_) => true,
        Value::String(s) => {
            let token = s.trim().to_lowercase();
            TRUTHY_TOKENS.contains(&token.as_str()) || FALSE_TOKENS.contains(&token.as_str())
        }
        _ => false,
    };
    (!ok).then(|| tr!(translate, "{{1}} must be true or false", label))
}

/// Range check with independent inclusive/exclusive bounds.
pub fn check_range(
    field: &FieldDefinition,
    n: f64,
    translate: &dyn Translate,
) -> Option<String> {
    let label = field.label();
    if let Some(min) = field.min {
        if field.min_inclusive && n < min {
            return Some(tr!(translate, "{{1}} must be at least {{2}}", label, format_number(min)));
        }
        if !field.min_inclusive && n <= min {
            return Some(tr!(
                translate,
                "{{1}} must be greater than {{2}}",
                label,
                format_number(min)
            ));
        }
    }
    if let Some(max) = field.max {
        if field.max_inclusive && n > max {
            return Some(tr!(translate, "{{1}} must be at most {{2}}", label, format_number(max)));
        }
        if !field.max_inclusive && n >= max {
            return Some(tr!(
                translate,
                "{{1}} must be less than {{2}}",
                label,
                format_number(max)
            ));
        }
    }
    None
}

fn validate_number(field: &FieldDefinition, value: &Value, translate: &dyn Translate) -> Option<String> {
    match loose_number(value) {
        Some(n) => check_range(field, n, translate),
        None => Some(tr!(translate, "{{1}} must be a number", field.label())),
    }
}

fn validate_integer(field: &FieldDefinition, value: &Value, translate: &dyn Translate) -> Option<String> {
    match loose_number(value) {
        Some(n) if n.fract() != 0.0 => {
            Some(tr!(translate, "{{1}} must be a whole number", field.label()))
        }
        Some(n) => check_range(field, n, translate),
        None => Some(tr!(translate, "{{1}} must be a whole number", field.label())),
    }
}

fn option_keys(field: &FieldDefinition) -> Option<Vec<String>> {
    field
        .options
        .as_ref()
        .map(|options| options.iter().filter_map(|o| o.key()).collect())
}

fn check_option(
    field: &FieldDefinition,
    value: &Value,
    translate: &dyn Translate,
) -> Option<String> {
    let keys = option_keys(field)?;
    let key = loose_string(value).unwrap_or_default();
    (!keys.contains(&key)).then(|| {
        tr!(
            translate,
            "{{1}} must be one of: {{2}}",
            field.label(),
            keys.join(", ")
        )
    })
}

fn validate_select(field: &FieldDefinition, value: &Value, translate: &dyn Translate) -> Option<String> {
    if value.is_array() || value.is_object() {
        return Some(tr!(translate, "{{1}} must be a single choice", field.label()));
    }
    check_option(field, value, translate)
}

fn check_items(field: &FieldDefinition, count: usize, translate: &dyn Translate) -> Option<String> {
    let label = field.label();
    if let Some(min) = field.min_items {
        if count < min {
            return Some(tr!(translate, "{{1}} needs at least {{2}} items", label, min));
        }
    }
    if let Some(max) = field.max_items {
        if count > max {
            return Some(tr!(translate, "{{1}} allows at most {{2}} items", label, max));
        }
    }
    None
}

fn validate_multiselect(
    field: &FieldDefinition,
    value: &Value,
    translate: &dyn Translate,
) -> Option<String> {
    let Value::Array(items) = value else {
        return Some(tr!(translate, "{{1}} must be a list", field.label()));
    };
    check_items(field, items.len(), translate)
        .or_else(|| items.iter().find_map(|item| check_option(field, item, translate)))
}

fn validate_unit(field: &FieldDefinition, value: &Value, translate: &dyn Translate) -> Option<String> {
    let label = field.label();
    let Value::Array(parts) = value else {
        return Some(tr!(translate, "{{1}} must be a measurement", label));
    };
    if parts.len() != 2 {
        return Some(tr!(translate, "{{1}} must be a measurement", label));
    }
    let unit = match &parts[1] {
        Value::String(u) if !u.trim().is_empty() => u.trim(),
        _ => return Some(tr!(translate, "{{1}} needs a unit", label)),
    };
    if let Some(dimension) = field.unit_dimension() {
        if !dimension.has_unit(unit) {
            return Some(tr!(translate, "{{1}} has an unknown unit {{2}}", label, unit));
        }
    }
    if parts[0].is_null() {
        return None;
    }
    validate_number(field, &parts[0], translate)
}

fn validate_file(field: &FieldDefinition, value: &Value, translate: &dyn Translate) -> Option<String> {
    let label = field.label();
    let named = value
        .get("name")
        .and_then(Value::as_str)
        .is_some_and(|name| !name.trim().is_empty());
    if !value.is_object() || !named {
        return Some(tr!(translate, "{{1}} must be a file", label));
    }
    let size = value.get("size").and_then(Value::as_u64);
    match (size, field.max_file_size) {
        (Some(size), Some(max)) if size > max => Some(tr!(
            translate,
            "{{1}} must be smaller than {{2}} bytes",
            label,
            max
        )),
        _ => None,
    }
}

fn validate_date(label: &str, value: &Value, translate: &dyn Translate) -> Option<String> {
    let valid = value.as_str().is_some_and(|s| {
        let s = s.trim();
        s.len() == 10 && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
    });
    (!valid).then(|| tr!(translate, "{{1}} must be a date (YYYY-MM-DD)", label))
}
