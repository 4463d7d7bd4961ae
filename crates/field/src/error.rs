//! Error types for the cmbs-field crate.

use cmbs_time::TimeError;

/// Error type for all fallible operations in the cmbs-field crate.
///
/// This enum covers incompatible operand shapes, unusable time axes,
/// operations invoked on geometries they do not support, and invalid
/// user-supplied parameters such as regions or time windows.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    /// Returned when operand shapes are incompatible.
    #[error("dimension mismatch in {operation}: expected {expected:?}, got {got:?}")]
    DimensionMismatch {
        /// Operation that detected the mismatch.
        operation: &'static str,
        /// Expected shape.
        expected: Vec<usize>,
        /// Actual shape.
        got: Vec<usize>,
    },

    /// Returned when the time axis is missing, unordered, or cannot be
    /// decoded, or when a required time cycle is not set.
    #[error("invalid time specification: {reason}")]
    InvalidTimeSpec {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when an operation is invoked on an unsupported array rank.
    #[error("{operation} is not supported for rank-{ndim} data")]
    UnsupportedGeometry {
        /// Operation that was invoked.
        operation: &'static str,
        /// Rank of the data.
        ndim: usize,
    },

    /// Returned when anomalies against the full record are requested but no
    /// climatology was cached.
    #[error("no cached climatology available")]
    MissingClimatology,

    /// Returned when a requested time window is inverted or selects nothing.
    #[error("invalid time range: {reason}")]
    InvalidTimeRange {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when region bounds are inconsistent or unusable.
    #[error("invalid region '{label}': {reason}")]
    InvalidRegion {
        /// Label of the region.
        label: String,
        /// Description of the problem.
        reason: String,
    },

    /// Returned when a numeric parameter is out of its valid range.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Description of the problem.
        reason: String,
    },

    /// Wraps an ndarray shape error.
    #[error("shape error: {reason}")]
    Shape {
        /// Description of the underlying failure.
        reason: String,
    },
}

impl From<TimeError> for FieldError {
    fn from(e: TimeError) -> Self {
        FieldError::InvalidTimeSpec {
            reason: e.to_string(),
        }
    }
}

impl From<ndarray::ShapeError> for FieldError {
    fn from(e: ndarray::ShapeError) -> Self {
        FieldError::Shape {
            reason: e.to_string(),
        }
    }
}
