//! Validation for Formwork fields and forms
//!
//! Validators live in three registries held by one [`ValidatorRegistry`]:
//! sealed built-in type validators, definition-scoped custom field
//! validators, and async form validators.
//!
//! ```
//! use formwork_common::Untranslated;
//! use formwork_fields::{FieldDefinition, FieldType};
//! use formwork_validation::ValidatorRegistry;
//! use serde_json::json;
//!
//! let registry = ValidatorRegistry::new();
//! let age = FieldDefinition::new("age", FieldType::Number).with_min(18.0, true);
//!
//! let message = registry.validate_field("signup", &age, &json!(12), &Untranslated);
//! assert_eq!(message.as_deref(), Some("age must be at least 18"));
//! ```

mod builtin;
mod pipeline;
mod registry;
mod validator;

pub use builtin::{check_range, required_message, BuiltinValidator};
pub use pipeline::run_form_validator;
pub use registry::{ValidatorRegistry, SHARED_NAMESPACE};
pub use validator::{
    form_validator_fn, validator_fn, FieldValidator, FnFormValidator, FnValidator, FormValidator,
    TypeValidator,
};
