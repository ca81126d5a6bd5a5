//! Field and form validation.
//!
//! A field is checked in tiers:
//!
//! 1. emptiness: an empty value fails a required field,
//! 2. the type validator registered for the field's type tag, skipped for
//!    empty values,
//! 3. the custom validator named by `validationHandlerName`, which also sees
//!    empty values of optional fields.
//!
//! The first message wins. The form tier runs separately through
//! [`ValidatorRegistry::validate_form`].

use crate::builtin::required_message;
use crate::registry::ValidatorRegistry;
use formwork_common::{is_empty_value, tr, FieldValues, Translate};
use formwork_fields::{
    panic_message, FieldDefinition, FormDefinition, ValidationErrorMap, VisibilityMap,
};
use futures::FutureExt;
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use tracing::{debug, warn};

impl ValidatorRegistry {
    /// Validate one value. Returns the first problem found.
    pub fn validate_field(
        &self,
        definition_name: &str,
        field: &FieldDefinition,
        value: &Value,
        translate: &dyn Translate,
    ) -> Option<String> {
        let empty = is_empty_value(value);
        if empty && field.required {
            return Some(required_message(field, translate));
        }

        if !empty {
            let tag = field.field_type.as_str();
            if let Some(validator) = self.type_validator(tag) {
                if let Some(message) = validator.validate(field, value, translate) {
                    return Some(message);
                }
            }
        }

        let handler = field.validation_handler_name.as_deref()?;
        match self.field_validator(definition_name, handler) {
            Some(validator) => validator.validate(field, value, translate),
            None => {
                warn!(
                    definition = definition_name,
                    field = %field.name,
                    handler,
                    "custom validator not registered"
                );
                None
            }
        }
    }

    /// Run the form validator named by the definition, if any.
    ///
    /// Returns `None` when no validator is named or registered, or when it
    /// reports no problems. A panicking validator is reported as one message.
    pub async fn validate_form(
        &self,
        definition: &FormDefinition,
        values: &FieldValues,
        translate: &dyn Translate,
    ) -> Option<Vec<String>> {
        let name = definition.validation_handler_name.as_deref()?;
        let Some(validator) = self.form_validator(name) else {
            debug!(definition = %definition.name, handler = name, "form validator not registered");
            return None;
        };
        run_form_validator(validator.as_ref(), values, translate).await
    }

    /// Validate every visible field. Hidden fields are never reported.
    pub fn validate_all(
        &self,
        definition: &FormDefinition,
        values: &FieldValues,
        visibility: &VisibilityMap,
        translate: &dyn Translate,
    ) -> ValidationErrorMap {
        definition
            .properties()
            .iter()
            .filter(|field| visibility.get(&field.name).copied().unwrap_or(false))
            .filter_map(|field| {
                let value = values.get(&field.name).unwrap_or(&Value::Null);
                self.validate_field(&definition.name, field, value, translate)
                    .map(|message| (field.name.clone(), message))
            })
            .collect()
    }
}

/// Await a form validator, turning a panic into a single message.
pub async fn run_form_validator(
    validator: &dyn crate::FormValidator,
    values: &FieldValues,
    translate: &dyn Translate,
) -> Option<Vec<String>> {
    let outcome = AssertUnwindSafe(validator.validate(values, translate))
        .catch_unwind()
        .await;
    let errors = match outcome {
        Ok(errors) => errors,
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            warn!(%message, "form validator panicked");
            vec![tr!(translate, "Form validation failed: {{1}}", message)]
        }
    };
    (!errors.is_empty()).then_some(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::{form_validator_fn, validator_fn, FormValidator};
    use async_trait::async_trait;
    use formwork_common::Untranslated;
    use formwork_fields::FieldType;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn even() -> Arc<dyn crate::FieldValidator> {
        Arc::new(validator_fn(|field, value, t| {
            let n = value.as_i64()?;
            (n % 2 != 0).then(|| tr!(t, "{{1}} must be even", field.label()))
        }))
    }

    #[test]
    fn test_required_and_optional_empty_values() {
        let registry = ValidatorRegistry::new();
        let required = FieldDefinition::new("name", FieldType::String).with_required(true);
        let optional = FieldDefinition::new("nick", FieldType::String).with_length(Some(3), None);

        for empty in [Value::Null, json!(""), json!([])] {
            assert_eq!(
                registry
                    .validate_field("d", &required, &empty, &Untranslated)
                    .unwrap(),
                "name is required"
            );
            assert!(registry
                .validate_field("d", &optional, &empty, &Untranslated)
                .is_none());
        }
        assert!(registry
            .validate_field("d", &required, &json!(false), &Untranslated)
            .is_some(), "false is a value, and not text");
    }

    #[test]
    fn test_custom_validator_sees_empty_optional_values() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let mut registry = ValidatorRegistry::new();
        registry.register_field_validator(
            "d",
            "always",
            Arc::new(validator_fn(move |_, _, _| {
                counted.fetch_add(1, Ordering::SeqCst);
                Some("custom says no".to_string())
            })),
        );
        let optional = FieldDefinition::new("note", FieldType::String)
            .with_length(Some(3), None)
            .with_validation_handler("always");

        assert_eq!(
            registry.validate_field("d", &optional, &json!(""), &Untranslated).as_deref(),
            Some("custom says no")
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1, "length rule skipped for empty text");

        let required = optional.clone().with_required(true);
        assert_eq!(
            registry.validate_field("d", &required, &Value::Null, &Untranslated).as_deref(),
            Some("note is required")
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_type_validator_short_circuits_custom() {
        let mut registry = ValidatorRegistry::new();
        registry.register_field_validator("d", "even", even());
        let field = FieldDefinition::new("n", FieldType::Number)
            .with_max(10.0, true)
            .with_validation_handler("even");

        assert_eq!(
            registry.validate_field("d", &field, &json!(11), &Untranslated).unwrap(),
            "n must be at most 10"
        );
        assert_eq!(
            registry.validate_field("d", &field, &json!(3), &Untranslated).unwrap(),
            "n must be even"
        );
        assert!(registry.validate_field("d", &field, &json!(4), &Untranslated).is_none());
        assert!(registry
            .validate_field("other", &field, &json!(3), &Untranslated)
            .is_none(), "handler is scoped to its definition");
    }

    #[test]
    fn test_custom_type_uses_registered_validator() {
        let mut registry = ValidatorRegistry::new();
        registry.register_type(
            "color",
            Arc::new(validator_fn(|field, value, t| {
                let hex = value.as_str().unwrap_or_default();
                (!hex.starts_with('#')).then(|| tr!(t, "{{1}} must be a hex color", field.label()))
            })),
        );
        let field = FieldDefinition::new("bg", "color".parse().unwrap());
        assert!(registry.validate_field("d", &field, &json!("#fff"), &Untranslated).is_none());
        assert!(registry.validate_field("d", &field, &json!("red"), &Untranslated).is_some());

        let unknown = FieldDefinition::new("x", "mystery".parse().unwrap());
        assert!(registry.validate_field("d", &unknown, &json!(1), &Untranslated).is_none());
    }

    #[test]
    fn test_messages_go_through_translate() {
        let registry = ValidatorRegistry::new();
        let field = FieldDefinition::new("edad", FieldType::Number).with_required(true);
        let spanish = formwork_common::from_fn(|text: &str, args: &[String]| {
            let text = if text == "{{1}} is required" {
                "{{1}} es obligatorio"
            } else {
                text
            };
            formwork_common::substitute_placeholders(text, args)
        });
        assert_eq!(
            registry.validate_field("d", &field, &Value::Null, &spanish).unwrap(),
            "edad es obligatorio"
        );
    }

    #[test]
    fn test_validate_all_skips_hidden_fields() {
        let registry = ValidatorRegistry::new();
        let definition = FormDefinition::new(
            "d",
            "1",
            vec![
                FieldDefinition::new("shown", FieldType::String).with_required(true),
                FieldDefinition::new("hidden", FieldType::String).with_required(true),
            ],
        );
        let visibility: VisibilityMap = [("shown".to_string(), true), ("hidden".to_string(), false)]
            .into_iter()
            .collect();

        let errors = registry.validate_all(&definition, &FieldValues::new(), &visibility, &Untranslated);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors["shown"], "shown is required");
    }

    struct Totals;

    #[async_trait]
    impl FormValidator for Totals {
        async fn validate(&self, values: &FieldValues, t: &dyn Translate) -> Vec<String> {
            tokio::task::yield_now().await;
            let a = values.get("a").and_then(Value::as_f64).unwrap_or(0.0);
            let b = values.get("b").and_then(Value::as_f64).unwrap_or(0.0);
            if a + b > 10.0 {
                vec![tr!(t, "a and b together must not exceed {{1}}", 10)]
            } else {
                vec![]
            }
        }
    }

    fn totals_definition() -> FormDefinition {
        FormDefinition::new("d", "1", vec![]).with_validation_handler("totals")
    }

    #[tokio::test]
    async fn test_validate_form_runs_named_validator() {
        let mut registry = ValidatorRegistry::new();
        registry.register_form_validator("totals", Arc::new(Totals));
        let mut values = FieldValues::new();
        values.insert("a".into(), json!(6));
        values.insert("b".into(), json!(7));

        let errors = registry
            .validate_form(&totals_definition(), &values, &Untranslated)
            .await
            .unwrap();
        assert_eq!(errors, vec!["a and b together must not exceed 10"]);

        values.insert("b".into(), json!(1));
        assert!(registry
            .validate_form(&totals_definition(), &values, &Untranslated)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_validate_form_without_validator_is_none() {
        let registry = ValidatorRegistry::new();
        assert!(registry
            .validate_form(&totals_definition(), &FieldValues::new(), &Untranslated)
            .await
            .is_none());
        let unnamed = FormDefinition::new("d", "1", vec![]);
        assert!(registry
            .validate_form(&unnamed, &FieldValues::new(), &Untranslated)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_panicking_form_validator_becomes_message() {
        let mut registry = ValidatorRegistry::new();
        registry.register_form_validator(
            "totals",
            Arc::new(form_validator_fn(|_, _| panic!("boom"))),
        );
        let errors = registry
            .validate_form(&totals_definition(), &FieldValues::new(), &Untranslated)
            .await
            .unwrap();
        assert_eq!(errors, vec!["Form validation failed: boom"]);
    }
}
