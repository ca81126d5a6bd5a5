//! # Formwork Fields
//!
//! The definition and instance model.
//!
//! - [`FormDefinition`] / [`FieldDefinition`] describe a form's fields, types,
//!   constraints and parent triggers. Definitions are immutable once loaded.
//! - [`FormInstance`] is a named value set for one definition version.
//! - [`load_definition`] and [`load_instance`] turn JSON into these types,
//!   collecting every structural violation into one [`SchemaError`].
//! - [`upgrade_instance`] migrates an instance to a new definition version.
//!
//! ```
//! use formwork_fields::{create_instance_from_definition, load_definition};
//!
//! let definition = load_definition(r#"{
//!     "name": "pets", "version": "1",
//!     "properties": [
//!         {"name": "hasPet", "type": "select", "options": ["yes", "no"], "defaultValue": "no"},
//!         {"name": "petName", "type": "string", "parents": {"hasPet": ["yes"]}}
//!     ]
//! }"#).unwrap();
//!
//! let instance = create_instance_from_definition(&definition, "draft");
//! assert_eq!(instance.values["hasPet"], "no");
//! ```

mod definition;
mod error;
mod instance;
mod migration;
mod types;

pub use definition::{
    definition_from_value, find_cycle, load_definition, load_definition_with, CyclePolicy,
    LoadOptions,
};
pub use formwork_common::FieldValues;
pub use error::{MigrationError, Result, SchemaError};
pub use instance::{create_instance_from_definition, instance_from_value, load_instance};
pub use migration::{
    number_value, panic_message, upgrade_instance, HookError, MigrationHook, MigrationOptions,
    UnknownKeyPolicy, ValueConverter, TRUTHY_TOKENS,
};
pub use types::{
    FieldDefinition, FieldOption, FieldType, FormDefinition, FormInstance, ValidationErrorMap,
    ValueShape, VisibilityMap,
};
