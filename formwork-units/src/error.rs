//! Error types for unit conversion

use crate::Dimension;
use thiserror::Error;

/// Result type for unit operations
pub type Result<T> = std::result::Result<T, UnitError>;

/// Errors returned by [`crate::convert`] and dimension parsing
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitError {
    /// The value to convert is NaN or infinite
    #[error("cannot convert non-finite value {value}")]
    NonFinite { value: f64 },

    /// The unit code is not part of the dimension's table
    #[error("unknown unit '{unit}' for dimension {dimension}")]
    UnknownUnit { unit: String, dimension: Dimension },

    /// The dimension name is not recognised
    #[error("unknown dimension: {dimension}")]
    UnknownDimension { dimension: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = UnitError::UnknownUnit {
            unit: "furlong".into(),
            dimension: Dimension::Area,
        };
        assert_eq!(err.to_string(), "unknown unit 'furlong' for dimension area");
    }
}
