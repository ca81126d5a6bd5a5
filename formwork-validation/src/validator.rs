//! Validator traits for the three registry tiers.

use async_trait::async_trait;
use formwork_common::{FieldValues, Translate};
use formwork_fields::FieldDefinition;
use serde_json::Value;

/// Validates values of one field type. Pure and synchronous.
pub trait TypeValidator: Send + Sync {
    fn validate(
        &self,
        field: &FieldDefinition,
        value: &Value,
        translate: &dyn Translate,
    ) -> Option<String>;
}

/// A host-supplied per-field rule, run after the type validator passes.
/// Pure and synchronous.
pub trait FieldValidator: Send + Sync {
    fn validate(
        &self,
        field: &FieldDefinition,
        value: &Value,
        translate: &dyn Translate,
    ) -> Option<String>;
}

/// A whole-form rule. May await, e.g. for a server round trip.
///
/// Returns every problem found; an empty list means the form passes.
#[async_trait]
pub trait FormValidator: Send + Sync {
    async fn validate(&self, values: &FieldValues, translate: &dyn Translate) -> Vec<String>;
}

/// Closure adapter for [`TypeValidator`] and [`FieldValidator`].
pub struct FnValidator<F>(F);

impl<F> TypeValidator for FnValidator<F>
where
    F: Fn(&FieldDefinition, &Value, &dyn Translate) -> Option<String> + Send + Sync,
{
    fn validate(
        &self,
        field: &FieldDefinition,
        value: &Value,
        translate: &dyn Translate,
    ) -> Option<String> {
        (self.0)(field, value, translate)
    }
}

impl<F> FieldValidator for FnValidator<F>
where
    F: Fn(&FieldDefinition, &Value, &dyn Translate) -> Option<String> + Send + Sync,
{
    fn validate(
        &self,
        field: &FieldDefinition,
        value: &Value,
        translate: &dyn Translate,
    ) -> Option<String> {
        (self.0)(field, value, translate)
    }
}

/// Wrap a closure as a type or field validator.
pub fn validator_fn<F>(f: F) -> FnValidator<F>
where
    F: Fn(&FieldDefinition, &Value, &dyn Translate) -> Option<String> + Send + Sync,
{
    FnValidator(f)
}

/// Closure adapter for synchronous [`FormValidator`]s.
pub struct FnFormValidator<F>(F);

#[async_trait]
impl<F> FormValidator for FnFormValidator<F>
where
    F: Fn(&FieldValues, &dyn Translate) -> Vec<String> + Send + Sync,
{
    async fn validate(&self, values: &FieldValues, translate: &dyn Translate) -> Vec<String> {
        (self.0)(values, translate)
    }
}

/// Wrap a synchronous closure as a form validator.
pub fn form_validator_fn<F>(f: F) -> FnFormValidator<F>
where
    F: Fn(&FieldValues, &dyn Translate) -> Vec<String> + Send + Sync,
{
    FnFormValidator(f)
}
