//! # Formwork
//!
//! A declarative form-schema engine. Given a definition (fields, types,
//! constraints and conditional dependencies) and an instance (a named set of
//! values), Formwork decides which fields are visible, validates values,
//! migrates instances between definition versions, converts unit values and
//! runs submissions.
//!
//! [`FormEngine`] holds configuration and the pluggable registries;
//! [`FormSession`] tracks one form while it is being filled in.
//!
//! ```
//! use formwork::FormEngine;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let engine = FormEngine::new();
//! let definition = engine.load_definition(r#"{
//!     "name": "pets", "version": "1",
//!     "properties": [
//!         {"name": "hasPet", "type": "boolean", "defaultValue": "no"},
//!         {"name": "petName", "type": "string", "required": true,
//!          "parents": {"hasPet": ["yes"]}}
//!     ]
//! }"#)?;
//!
//! let mut session = engine.new_session(Arc::new(definition), "mine");
//! assert!(!session.is_visible("petName"));
//!
//! let change = session.set_value("hasPet", json!("yes"))?;
//! assert_eq!(change.shown, vec!["petName"]);
//! # Ok::<(), formwork::FormworkError>(())
//! ```

mod engine;
mod error;
mod session;

pub use engine::FormEngine;
pub use error::{FormworkError, Result};
pub use session::{FieldChange, FormSession};

pub use formwork_common::{tr, FieldValues, Translate, Untranslated};
pub use formwork_config::{ConfigProvider, FormworkConfig};
pub use formwork_fields::{
    FieldDefinition, FieldType, FormDefinition, FormInstance, ValidationErrorMap, VisibilityMap,
};
pub use formwork_submit::{HandlerReply, SubmitHandler, SubmitOutcome};
pub use formwork_units::Dimension;
