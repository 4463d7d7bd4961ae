//! Error types for cmbs-io.

use std::path::PathBuf;

use cmbs_field::FieldError;
use cmbs_time::TimeError;

/// Error type for all fallible operations in the cmbs-io crate.
///
/// This enum covers missing files and variables, failures of the NetCDF
/// library, level selection on 4-D variables, malformed buffers and
/// attributes, configuration problems, and errors raised while assembling
/// the field.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when a required file does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path that could not be found.
        path: PathBuf,
    },

    /// Returned when a required variable or data source is absent.
    #[error("resource '{name}' not found in {location}")]
    ResourceNotFound {
        /// Name of the missing variable or source.
        name: String,
        /// Source that was inspected.
        location: String,
    },

    /// Wraps an error originating from the NetCDF library.
    #[error("netcdf error: {reason}")]
    Netcdf {
        /// Description of the underlying NetCDF failure.
        reason: String,
    },

    /// Returned when a 4-D variable is read without a level.
    #[error("variable '{name}' is 4-dimensional; a level must be specified")]
    MissingLevel {
        /// Name of the variable.
        name: String,
    },

    /// Returned when the requested level does not exist.
    #[error("level {level} out of range for '{name}' with {n_levels} level(s)")]
    InvalidLevel {
        /// Name of the variable.
        name: String,
        /// Requested level index.
        level: usize,
        /// Number of levels available.
        n_levels: usize,
    },

    /// Returned when a variable has more than four dimensions.
    #[error("variable '{name}' has unsupported rank {ndim}")]
    UnsupportedRank {
        /// Name of the variable.
        name: String,
        /// Number of dimensions.
        ndim: usize,
    },

    /// Returned when a buffer length does not match its shape.
    #[error("dimension '{name}' mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Name of the buffer.
        name: String,
        /// Expected number of elements.
        expected: usize,
        /// Actual number of elements.
        got: usize,
    },

    /// Returned when a variable attribute cannot be interpreted.
    #[error("invalid attribute '{name}': {reason}")]
    InvalidAttribute {
        /// Attribute name.
        name: String,
        /// Description of the problem.
        reason: String,
    },

    /// Returned when one or more validation checks fail.
    #[error("{count} validation error(s): {details}")]
    Validation {
        /// Number of accumulated validation failures.
        count: usize,
        /// Human-readable summary of the failures.
        details: String,
    },

    /// Propagated from field construction and operations.
    #[error(transparent)]
    Field(#[from] FieldError),

    /// Propagated from time axis decoding.
    #[error(transparent)]
    Time(#[from] TimeError),
}

#[cfg(feature = "netcdf")]
impl From<netcdf::Error> for IoError {
    fn from(e: netcdf::Error) -> Self {
        IoError::Netcdf {
            reason: e.to_string(),
        }
    }
}
