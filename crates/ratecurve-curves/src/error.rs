//! Error types for curve, schedule, and solver operations.

use ratecurve_math::MathError;
use thiserror::Error;

/// A specialized Result type for curve operations.
pub type CurveResult<T> = Result<T, CurveError>;

/// Errors that can occur during curve, schedule, and calibration operations.
#[derive(Error, Debug, Clone)]
pub enum CurveError {
    /// Invalid curve or schedule data.
    #[error("invalid curve data: {reason}")]
    InvalidData {
        /// Description of what's invalid.
        reason: String,
    },

    /// The weight vector's length does not match the number of calibration
    /// quotes, so the normal-equations system cannot be formed.
    #[error("dimension mismatch: {n} node(s) but {m} quote(s)/weight(s)")]
    Dimension {
        /// Number of free node values (`n`).
        n: usize,
        /// Number of calibration quotes (`m`).
        m: usize,
    },

    /// Core library error (e.g. invalid date).
    #[error("core error: {0}")]
    Core(#[from] ratecurve_core::CoreError),

    /// Underlying math error (singular system, domain violation, ...).
    #[error("math error: {0}")]
    Math(#[from] MathError),
}

impl CurveError {
    /// Creates an invalid data error.
    #[must_use]
    pub fn invalid_data(reason: impl Into<String>) -> Self {
        Self::InvalidData {
            reason: reason.into(),
        }
    }

    /// Creates a dimension mismatch error.
    #[must_use]
    pub fn dimension(n: usize, m: usize) -> Self {
        Self::Dimension { n, m }
    }
}
