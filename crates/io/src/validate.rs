//! Accumulated validation.
//!
//! Provides [`ValidationCollector`] for gathering multiple validation errors
//! into a single [`IoError::Validation`].

use crate::error::IoError;

/// Accumulates validation errors and converts them into a single
/// [`IoError::Validation`].
pub(crate) struct ValidationCollector {
    errors: Vec<String>,
}

impl ValidationCollector {
    pub(crate) fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Record one validation error.
    pub(crate) fn push(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    /// Records `msg` when `failed` holds.
    pub(crate) fn check(&mut self, failed: bool, msg: impl FnOnce() -> String) {
        if failed {
            self.push(msg());
        }
    }

    /// Consume the collector and return `Ok(())` if no errors were recorded,
    /// or `Err(IoError::Validation { count, details })` otherwise.
    ///
    /// The `details` string joins all messages with `"; "`.
    pub(crate) fn finish(self) -> Result<(), IoError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(IoError::Validation {
                count: self.errors.len(),
                details: self.errors.join("; "),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_collector_is_ok() {
        assert!(ValidationCollector::new().finish().is_ok());
    }

    #[test]
    fn messages_are_joined() {
        let mut c = ValidationCollector::new();
        c.push("first");
        c.check(false, || "skipped".into());
        c.check(true, || "second".into());
        match c.finish() {
            Err(IoError::Validation { count, details }) => {
                assert_eq!(count, 2);
                assert_eq!(details, "first; second");
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }
}
