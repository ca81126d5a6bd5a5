//! Turning entered values into typed values before submission.
//!
//! Widgets hand over text; handlers expect numbers. Number fields parse
//! their text (an empty string reads as `0`), number arrays split delimited
//! text and parse every element, and unit tuples parse their magnitude.
//! Any element that does not parse stops the submission with
//! [`SubmitError::Transformation`] naming the field and the element.

use crate::error::{Result, SubmitError};
use formwork_common::{loose_string, FieldValues};
use formwork_fields::{number_value, FieldDefinition, FieldType, FormDefinition};
use serde_json::Value;
use tracing::trace;

/// Transform every value of a field known to `definition`. Values without a
/// field are passed through unchanged.
pub fn transform_values(
    definition: &FormDefinition,
    values: &FieldValues,
    array_delimiter: &str,
) -> Result<FieldValues> {
    let mut transformed = values.clone();
    for field in definition.properties() {
        if let Some(value) = transformed.get_mut(&field.name) {
            *value = transform_value(field, value, array_delimiter)?;
        }
    }
    Ok(transformed)
}

/// Transform one value according to its field type.
pub fn transform_value(field: &FieldDefinition, value: &Value, array_delimiter: &str) -> Result<Value> {
    let out = match (&field.field_type, value) {
        (FieldType::Number | FieldType::Integer, Value::String(text)) => parse_number(field, text)?,
        (FieldType::NumberArray, Value::String(text)) => Value::Array(
            text.split(array_delimiter)
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| parse_number(field, part))
                .collect::<Result<_>>()?,
        ),
        (FieldType::NumberArray, Value::Array(items)) => Value::Array(
            items
                .iter()
                .map(|item| parse_element(field, item))
                .collect::<Result<_>>()?,
        ),
        (FieldType::Unit, Value::Array(parts)) if parts.len() == 2 => {
            let magnitude = match &parts[0] {
                Value::String(text) if text.trim().is_empty() => Value::Null,
                Value::String(text) => parse_number(field, text)?,
                other => other.clone(),
            };
            Value::Array(vec![magnitude, parts[1].clone()])
        }
        _ => value.clone(),
    };
    if &out != value {
        trace!(field = %field.name, from = %value, to = %out, "transformed value");
    }
    Ok(out)
}

fn parse_element(field: &FieldDefinition, item: &Value) -> Result<Value> {
    match item {
        Value::Number(_) => Ok(item.clone()),
        Value::String(text) => parse_number(field, text),
        other => Err(invalid(field, &loose_string(other).unwrap_or_else(|| "null".into()))),
    }
}

fn parse_number(field: &FieldDefinition, text: &str) -> Result<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Value::from(0));
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(number_value(n)),
        _ => Err(invalid(field, trimmed)),
    }
}

fn invalid(field: &FieldDefinition, element: &str) -> SubmitError {
    SubmitError::Transformation {
        field: field.name.clone(),
        element: element.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwork_units::Dimension;
    use serde_json::json;

    fn definition() -> FormDefinition {
        FormDefinition::new(
            "order",
            "1",
            vec![
                FieldDefinition::new("qty", FieldType::Integer),
                FieldDefinition::new("price", FieldType::Number),
                FieldDefinition::new("sizes", FieldType::NumberArray),
                FieldDefinition::new("length", FieldType::Unit).with_unit(Dimension::Length, "cm"),
                FieldDefinition::new("note", FieldType::String),
            ],
        )
    }

    fn values(json: Value) -> FieldValues {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_numbers_parse_and_empty_reads_as_zero() {
        let out = transform_values(
            &definition(),
            &values(json!({"qty": " 3 ", "price": "", "note": "12"})),
            ",",
        )
        .unwrap();
        assert_eq!(out["qty"], json!(3));
        assert_eq!(out["price"], json!(0));
        assert_eq!(out["note"], json!("12"));
    }

    #[test]
    fn test_number_arrays_split_on_delimiter() {
        let def = definition();
        let out = transform_values(&def, &values(json!({"sizes": "1, 2.5,,4"})), ",").unwrap();
        assert_eq!(out["sizes"], json!([1, 2.5, 4]));

        let out = transform_values(&def, &values(json!({"sizes": "1;2"})), ";").unwrap();
        assert_eq!(out["sizes"], json!([1, 2]));

        let out = transform_values(&def, &values(json!({"sizes": ["7", 8]})), ",").unwrap();
        assert_eq!(out["sizes"], json!([7, 8]));
    }

    #[test]
    fn test_bad_element_names_field_and_element() {
        let err = transform_values(&definition(), &values(json!({"sizes": "1, two, 3"})), ",")
            .unwrap_err();
        assert_eq!(
            err,
            SubmitError::Transformation {
                field: "sizes".into(),
                element: "two".into()
            }
        );

        let err = transform_values(&definition(), &values(json!({"price": "abc"})), ",").unwrap_err();
        assert!(matches!(err, SubmitError::Transformation { ref field, .. } if field == "price"));
    }

    #[test]
    fn test_unit_magnitude_parsed() {
        let def = definition();
        let out = transform_values(&def, &values(json!({"length": ["12.5", "cm"]})), ",").unwrap();
        assert_eq!(out["length"], json!([12.5, "cm"]));

        let out = transform_values(&def, &values(json!({"length": ["", "cm"]})), ",").unwrap();
        assert_eq!(out["length"], json!([null, "cm"]));
    }

    #[test]
    fn test_unknown_keys_and_nulls_pass_through() {
        let out = transform_values(
            &definition(),
            &values(json!({"extra": "1", "qty": null})),
            ",",
        )
        .unwrap();
        assert_eq!(out["extra"], json!("1"));
        assert_eq!(out["qty"], Value::Null);
    }
}
