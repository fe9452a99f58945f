//! Error types shared by the core types crate.

use thiserror::Error;

/// A specialized Result type for `ratecurve-core` operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// The error type for `ratecurve-core` operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Error in date calculations or invalid date.
    #[error("invalid date: {message}")]
    InvalidDate {
        /// Description of the date error.
        message: String,
    },
}

impl CoreError {
    /// Creates an invalid date error.
    #[must_use]
    pub fn invalid_date(message: impl Into<String>) -> Self {
        Self::InvalidDate {
            message: message.into(),
        }
    }
}
