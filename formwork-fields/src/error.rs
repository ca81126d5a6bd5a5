//! Error types for the definition and instance model

use thiserror::Error;

/// Result type for loading operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// A definition or instance document is malformed.
///
/// Loading is all-or-nothing: when any of these is returned no partially
/// populated value exists.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// The input is not valid JSON or does not match the document shape
    #[error("malformed {document}: {message}")]
    Parse {
        document: &'static str,
        message: String,
    },

    /// One or more structural rules are violated
    #[error("invalid {document}: {}", .violations.join("; "))]
    Invalid {
        document: &'static str,
        violations: Vec<String>,
    },

    /// Parent references form a cycle and cycles are rejected
    #[error("dependency cycle through fields: {}", .fields.join(", "))]
    Cycle { fields: Vec<String> },
}

impl SchemaError {
    /// Every individual problem as a message.
    pub fn violations(&self) -> Vec<String> {
        match self {
            SchemaError::Parse { message, .. } => vec![message.clone()],
            SchemaError::Invalid { violations, .. } => violations.clone(),
            SchemaError::Cycle { fields } => {
                vec![format!("dependency cycle through fields: {}", fields.join(", "))]
            }
        }
    }
}

/// An instance could not be migrated to a new definition version.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MigrationError {
    /// A value could not be coerced and migration is strict, or an explicit
    /// converter refused the value
    #[error("cannot migrate field '{field}' to {expected}: {reason}")]
    Coercion {
        field: String,
        expected: String,
        reason: String,
    },

    /// The post-processing hook returned an error or panicked
    #[error("migration hook failed: {message}")]
    Hook { message: String },
}
