//! The three validator registries.
//!
//! - Type validators are keyed by type tag. Every built-in tag is registered
//!   at construction and sealed; attempts to replace or remove one are
//!   rejected with a warning. New tags may be added for custom field types.
//! - Custom field validators are keyed by `(definition, handler)`. A handler
//!   registered under [`SHARED_NAMESPACE`] serves every definition that does
//!   not register its own. Resolved lookups are memoized per composite key;
//!   every registration change clears the memo.
//! - Form validators are keyed by handler name.
//!
//! Fill the registry during start-up. Mutation takes `&mut self`; lookups
//! take `&self` and may run from several threads once filling is done.

use crate::builtin::BuiltinValidator;
use crate::validator::{FieldValidator, FormValidator, TypeValidator};
use dashmap::DashMap;
use formwork_common::{Registration, Registry, DEFAULT_ARRAY_DELIMITER};
use formwork_fields::FieldType;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Namespace whose custom validators apply to every definition.
pub const SHARED_NAMESPACE: &str = "*";

const KEY_SEPARATOR: char = '\u{1f}';

fn composite_key(definition: &str, handler: &str) -> String {
    format!("{definition}{KEY_SEPARATOR}{handler}")
}

type LookupKey = (String, String);

/// Type, custom field and form validators for one engine.
pub struct ValidatorRegistry {
    types: Registry<dyn TypeValidator>,
    fields: Registry<dyn FieldValidator>,
    forms: Registry<dyn FormValidator>,
    lookups: DashMap<LookupKey, Option<Arc<dyn FieldValidator>>>,
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidatorRegistry {
    /// A registry holding the sealed built-in type validators.
    pub fn new() -> Self {
        Self::with_array_delimiter(DEFAULT_ARRAY_DELIMITER)
    }

    /// Like [`ValidatorRegistry::new`], reading number lists entered as text
    /// with `delimiter`. The built-in validators share one pattern cache.
    pub fn with_array_delimiter(delimiter: &str) -> Self {
        let patterns = Arc::default();
        let mut types: Registry<dyn TypeValidator> = Registry::new("type validator");
        for field_type in FieldType::BUILT_IN {
            let tag = field_type.as_str().to_string();
            let validator = BuiltinValidator::new(field_type)
                .with_array_delimiter(delimiter)
                .with_pattern_cache(Arc::clone(&patterns));
            types.register(tag, Arc::new(validator));
        }
        types.seal();

        Self {
            types,
            fields: Registry::new("field validator"),
            forms: Registry::new("form validator"),
            lookups: DashMap::new(),
        }
    }

    // Type validators

    /// Register a validator for a custom type tag. Built-in tags are refused.
    pub fn register_type(
        &mut self,
        tag: impl Into<String>,
        validator: Arc<dyn TypeValidator>,
    ) -> Registration {
        self.types.register(tag, validator)
    }

    pub fn unregister_type(&mut self, tag: &str) -> Option<Arc<dyn TypeValidator>> {
        self.types.unregister(tag)
    }

    pub fn type_validator(&self, tag: &str) -> Option<Arc<dyn TypeValidator>> {
        self.types.get(tag)
    }

    pub fn list_types(&self) -> Vec<String> {
        self.types.list()
    }

    pub fn is_built_in_type(&self, tag: &str) -> bool {
        self.types.is_reserved(tag)
    }

    // Custom field validators

    /// Register `validator` as `handler` for fields of `definition`.
    pub fn register_field_validator(
        &mut self,
        definition: &str,
        handler: &str,
        validator: Arc<dyn FieldValidator>,
    ) -> Registration {
        let outcome = self
            .fields
            .register(composite_key(definition, handler), validator);
        self.invalidate();
        outcome
    }

    /// Register `validator` as `handler` for every definition.
    pub fn register_shared_field_validator(
        &mut self,
        handler: &str,
        validator: Arc<dyn FieldValidator>,
    ) -> Registration {
        self.register_field_validator(SHARED_NAMESPACE, handler, validator)
    }

    pub fn unregister_field_validator(
        &mut self,
        definition: &str,
        handler: &str,
    ) -> Option<Arc<dyn FieldValidator>> {
        let removed = self.fields.unregister(&composite_key(definition, handler));
        self.invalidate();
        removed
    }

    /// Resolve `handler` for `definition`, falling back to the shared
    /// namespace. Results are memoized until the next registration change.
    pub fn field_validator(&self, definition: &str, handler: &str) -> Option<Arc<dyn FieldValidator>> {
        let key = (definition.to_string(), handler.to_string());
        if let Some(hit) = self.lookups.get(&key) {
            return hit.value().clone();
        }
        let resolved = self
            .fields
            .get(&composite_key(definition, handler))
            .or_else(|| self.fields.get(&composite_key(SHARED_NAMESPACE, handler)));
        trace!(definition, handler, found = resolved.is_some(), "resolved field validator");
        self.lookups.insert(key, resolved.clone());
        resolved
    }

    /// Registered `(definition, handler)` pairs, sorted.
    pub fn list_field_validators(&self) -> Vec<(String, String)> {
        self.fields
            .list()
            .into_iter()
            .filter_map(|key| {
                key.split_once(KEY_SEPARATOR)
                    .map(|(d, h)| (d.to_string(), h.to_string()))
            })
            .collect()
    }

    // Form validators

    pub fn register_form_validator(
        &mut self,
        name: impl Into<String>,
        validator: Arc<dyn FormValidator>,
    ) -> Registration {
        self.forms.register(name, validator)
    }

    pub fn unregister_form_validator(&mut self, name: &str) -> Option<Arc<dyn FormValidator>> {
        self.forms.unregister(name)
    }

    pub fn form_validator(&self, name: &str) -> Option<Arc<dyn FormValidator>> {
        self.forms.get(name)
    }

    pub fn list_form_validators(&self) -> Vec<String> {
        self.forms.list()
    }

    /// Drop every host registration. Built-in type validators stay.
    pub fn clear(&mut self) {
        self.types.clear();
        self.fields.clear();
        self.forms.clear();
        self.invalidate();
    }

    fn invalidate(&self) {
        self.lookups.clear();
    }
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorRegistry")
            .field("types", &self.types)
            .field("fields", &self.list_field_validators())
            .field("forms", &self.forms)
            .field("memoized", &self.lookups.len())
            .finish()
    }
}
