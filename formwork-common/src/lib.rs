//! # Formwork Common
//!
//! Foundational pieces shared by every Formwork crate:
//!
//! - [`translate`] - the injected `translate(text, args)` collaborator and
//!   `{{n}}` placeholder substitution
//! - [`registry`] - named registries with open or closed overwrite policy
//! - [`value`] - loose, string-oriented views over `serde_json::Value`
//! - [`logging`] - helpers for rendering structured values in log lines
//!
//! Nothing in this crate performs I/O.

pub mod logging;
pub mod registry;
pub mod translate;
pub mod value;

pub use logging::Pretty;
pub use registry::{Registration, Registry};
pub use translate::{from_fn, substitute_placeholders, FnTranslator, Translate, Untranslated};
pub use value::{
    format_number, is_empty_value, loose_number, loose_string, trigger_keys, DEFAULT_ARRAY_DELIMITER,
};

/// Field values keyed by field name.
pub type FieldValues = std::collections::BTreeMap<String, serde_json::Value>;
