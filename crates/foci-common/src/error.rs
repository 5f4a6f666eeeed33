//! Error types shared by the FOCI crates.

use thiserror::Error;

/// Result type alias using FociError.
pub type FociResult<T> = Result<T, FociError>;

/// Errors raised while building or querying in-memory fields.
#[derive(Debug, Error)]
pub enum FociError {
    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Time index {index} out of range (axis length {len})")]
    TimeOutOfRange { index: usize, len: usize },

    #[error("Invalid time units: {0}")]
    InvalidTimeUnits(String),
}

impl FociError {
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        FociError::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }
}
