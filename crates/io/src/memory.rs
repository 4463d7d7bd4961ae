//! In-memory reader for tests and synthetic data.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::IoError;
use crate::reader::{GridReader, RawTime, ReadResult, select_level};

#[derive(Debug, Clone, Default)]
struct MemorySource {
    variables: BTreeMap<String, ReadResult>,
    time: Option<RawTime>,
}

/// A [`GridReader`] backed by named in-memory sources.
///
/// # Example
///
/// ```
/// use cmbs_io::{GridReader, MemoryReader, RawTime, ReadResult};
///
/// let reader = MemoryReader::new()
///     .with_variable("obs", "tas", ReadResult::new(vec![1.0, 2.0], vec![2]))
///     .with_time("obs", RawTime::new(vec![0.0, 1.0]).with_units("days since 2000-01-01"));
/// let tas = reader.read("obs", "tas", None).unwrap().unwrap();
/// assert!(tas.time.is_some());
/// assert!(reader.read("obs", "pr", None).unwrap().is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    sources: BTreeMap<String, MemorySource>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) `variable` in `source`, creating the source.
    pub fn with_variable(
        mut self,
        source: impl Into<String>,
        variable: impl Into<String>,
        result: ReadResult,
    ) -> Self {
        self.sources
            .entry(source.into())
            .or_default()
            .variables
            .insert(variable.into(), result);
        self
    }

    /// Sets the time axis of `source`, creating the source.
    ///
    /// The time axis is attached to every variable read from the source.
    pub fn with_time(mut self, source: impl Into<String>, time: RawTime) -> Self {
        self.sources.entry(source.into()).or_default().time = Some(time);
        self
    }
}

impl GridReader for MemoryReader {
    fn read(
        &self,
        source: &str,
        variable: &str,
        level: Option<usize>,
    ) -> Result<Option<ReadResult>, IoError> {
        let src = self
            .sources
            .get(source)
            .ok_or_else(|| IoError::ResourceNotFound {
                name: source.to_string(),
                location: "memory reader".to_string(),
            })?;
        let Some(stored) = src.variables.get(variable) else {
            debug!(source, variable, "variable not present");
            return Ok(None);
        };

        let mut result = stored.clone();
        let (values, shape) = select_level(variable, result.values, result.shape, level)?;
        result.values = values;
        result.shape = shape;
        if result.time.is_none() {
            result.time = src.time.clone();
        }
        Ok(Some(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_source_is_an_error() {
        let reader = MemoryReader::new();
        assert!(matches!(
            reader.read("nowhere", "tas", None),
            Err(IoError::ResourceNotFound { .. })
        ));
    }

    #[test]
    fn four_d_variable_needs_level() {
        let reader = MemoryReader::new().with_variable(
            "obs",
            "ta",
            ReadResult::new(vec![0.0; 8], vec![2, 2, 1, 2]),
        );
        assert!(matches!(
            reader.read("obs", "ta", None),
            Err(IoError::MissingLevel { .. })
        ));
        let r = reader.read("obs", "ta", Some(0)).unwrap().unwrap();
        assert_eq!(r.shape, vec![2, 1, 2]);
    }
}
