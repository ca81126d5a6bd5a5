//! Submission failures

use formwork_fields::ValidationErrorMap;
use thiserror::Error;

/// Why a submission stopped. Each stage fails with its own variant and later
/// stages never run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubmitError {
    /// The caller already knew of field errors.
    #[error("form has {} outstanding field error(s)", errors.len())]
    ExistingErrors { errors: ValidationErrorMap },

    /// A value could not be read as its declared type.
    #[error("field '{field}' has an invalid element '{element}'")]
    Transformation { field: String, element: String },

    /// Visible fields failed validation.
    #[error("{} field(s) failed validation", errors.len())]
    FieldValidation { errors: ValidationErrorMap },

    /// The form-level validator reported problems.
    #[error("form validation failed: {}", errors.join("; "))]
    FormValidation { errors: Vec<String> },

    /// The handler answered with failure messages.
    #[error("submission rejected: {}", messages.join("; "))]
    Rejected { messages: Vec<String> },

    /// The handler failed, panicked or could not be found.
    #[error("submission handler failed: {message}")]
    Handler { message: String },
}

pub type Result<T> = std::result::Result<T, SubmitError>;
