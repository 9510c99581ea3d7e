//! Error types for the domain layer.

use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be at least {min}, got {actual}")]
    TooSmall { field: String, min: u64, actual: u64 },

    #[error("Field '{field}' must be at most {max}, got {actual}")]
    TooLarge { field: String, max: u64, actual: u64 },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates a lower-bound validation error.
    pub fn too_small(field: impl Into<String>, min: u64, actual: u64) -> Self {
        ValidationError::TooSmall {
            field: field.into(),
            min,
            actual,
        }
    }

    /// Creates an upper-bound validation error.
    pub fn too_large(field: impl Into<String>, max: u64, actual: u64) -> Self {
        ValidationError::TooLarge {
            field: field.into(),
            max,
            actual,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
