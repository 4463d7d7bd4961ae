//! Error types for the cmbs-time crate.

/// Error type for all fallible operations in the cmbs-time crate.
///
/// Covers unit strings that cannot be interpreted, raw time values that
/// cannot be placed on the calendar, and monthly axes with an irregular
/// stride.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimeError {
    /// Returned when a time axis comes without a units descriptor.
    #[error("time units are missing")]
    MissingUnits,

    /// Returned when the units descriptor matches none of the supported forms.
    #[error("unrecognized time units: '{units}'")]
    UnrecognizedUnits {
        /// The descriptor that was provided.
        units: String,
    },

    /// Returned when the reference date after `since` cannot be parsed.
    #[error("invalid base date: '{value}'")]
    InvalidBaseDate {
        /// The unparsable date text.
        value: String,
    },

    /// Returned when a `YYYYMMDD.f` value does not encode a calendar date.
    #[error("invalid day value: {value} (expected YYYYMMDD.f)")]
    InvalidDayValue {
        /// The offending raw value.
        value: f64,
    },

    /// Returned when a raw time value is NaN or infinite.
    #[error("non-finite raw time value at index {index}")]
    NonFiniteValue {
        /// Position of the value in the raw vector.
        index: usize,
    },

    /// Returned when a monthly offset is not a whole number of months.
    #[error("month offset {value} is not a whole number of months")]
    NonIntegerMonthOffset {
        /// The offending offset.
        value: f64,
    },

    /// Returned when the stride of a monthly axis is not a positive integer.
    #[error("invalid month stride: {stride} (must be a positive integer)")]
    InvalidMonthStride {
        /// The stride derived from the first two raw values.
        stride: f64,
    },

    /// Returned when the spacing of a monthly axis changes along the series.
    #[error("non-uniform month stride at index {index}: expected {expected}, got {got}")]
    NonUniformMonthStride {
        /// Index of the first sample of the offending step.
        index: usize,
        /// Stride of the first step.
        expected: f64,
        /// Stride found at `index`.
        got: f64,
    },

    /// Returned when a timestamp cannot be represented as a calendar date.
    #[error("timestamp {value} is out of the representable range")]
    OutOfRange {
        /// The timestamp in days since the epoch.
        value: f64,
    },

    /// Returned when year, month and day do not form a valid date.
    #[error("invalid date: {year}-{month:02}-{day:02}")]
    InvalidDate {
        /// Calendar year.
        year: i32,
        /// Month (1..=12 when valid).
        month: u32,
        /// Day of month.
        day: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_missing_units() {
        assert_eq!(TimeError::MissingUnits.to_string(), "time units are missing");
    }

    #[test]
    fn error_unrecognized_units() {
        let err = TimeError::UnrecognizedUnits {
            units: "fortnights since 2000-01-01".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unrecognized time units: 'fortnights since 2000-01-01'"
        );
    }

    #[test]
    fn error_non_uniform_stride() {
        let err = TimeError::NonUniformMonthStride {
            index: 3,
            expected: 1.0,
            got: 2.0,
        };
        assert_eq!(
            err.to_string(),
            "non-uniform month stride at index 3: expected 1, got 2"
        );
    }

    #[test]
    fn error_invalid_date() {
        let err = TimeError::InvalidDate {
            year: 2001,
            month: 2,
            day: 29,
        };
        assert_eq!(err.to_string(), "invalid date: 2001-02-29");
    }

    #[test]
    fn error_is_send_sync_and_std_error() {
        fn assert_bounds<T: Send + Sync + std::error::Error>() {}
        assert_bounds::<TimeError>();
    }

    #[test]
    fn error_is_clone_and_partial_eq() {
        let err = TimeError::NonFiniteValue { index: 4 };
        assert_eq!(err.clone(), err);
        assert_ne!(err, TimeError::NonFiniteValue { index: 5 });
    }
}
