//! Error types for the cmbs-regress crate.

use cmbs_field::FieldError;

/// Error type for all fallible operations in the cmbs-regress crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegressError {
    /// Returned when the operands of a regression do not line up.
    #[error("dimension mismatch in {operation}: expected {expected:?}, got {got:?}")]
    DimensionMismatch {
        /// Operation that detected the mismatch.
        operation: &'static str,
        /// Expected shape.
        expected: Vec<usize>,
        /// Actual shape.
        got: Vec<usize>,
    },

    /// Returned when the series is too short for a fit.
    #[error("insufficient valid samples: got {n}, need at least {min}")]
    InsufficientValidSamples {
        /// Number of samples available.
        n: usize,
        /// Minimum required.
        min: usize,
    },

    /// Returned when an operation is invoked on an unsupported geometry.
    #[error("{operation} is not supported for rank-{ndim} data")]
    UnsupportedGeometry {
        /// Operation that was invoked.
        operation: &'static str,
        /// Rank of the data.
        ndim: usize,
    },

    /// Returned when a [`RegressionConfig`](crate::RegressionConfig) fails
    /// validation.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },

    /// Propagated from field operations.
    #[error(transparent)]
    Field(#[from] FieldError),
}
