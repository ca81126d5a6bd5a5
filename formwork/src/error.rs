//! Error types for the Formwork facade

use formwork_config::ConfigError;
use formwork_fields::{MigrationError, SchemaError};
use formwork_units::UnitError;
use thiserror::Error;

/// Errors surfaced by [`FormEngine`](crate::FormEngine) and
/// [`FormSession`](crate::FormSession).
#[derive(Debug, Error)]
pub enum FormworkError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Migration(#[from] MigrationError),

    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The definition has no field of this name.
    #[error("unknown field '{name}'")]
    UnknownField { name: String },

    /// A unit operation was asked of a field that is not a unit field.
    #[error("field '{name}' is not a unit field")]
    NotAUnitField { name: String },

    /// A unit field without a recognised dimension.
    #[error("field '{name}' has no known dimension")]
    MissingDimension { name: String },
}

/// Result alias for facade operations
pub type Result<T> = std::result::Result<T, FormworkError>;
