//! Parsing of time-axis unit descriptors.
//!
//! Recognized forms:
//!
//! - `day as %Y%m%d.%f` (the fraction is a fraction of a day)
//! - `hours since <date>`
//! - `days since <date>`
//! - `months since <date>`
//!
//! `<date>` is `YYYY-M-D`, optionally followed by `H:M[:S[.f]]` separated by a
//! space or `T`, with an optional trailing `Z` or `UTC`.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::TimeError;

/// Step of a `<step> since <date>` descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeStep {
    Hours,
    Days,
    Months,
}

impl TimeStep {
    fn parse(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "hours" | "hour" => Some(Self::Hours),
            "days" | "day" => Some(Self::Days),
            "months" | "month" => Some(Self::Months),
            _ => None,
        }
    }
}

/// A parsed time-axis units descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnits {
    /// Raw values encode `YYYYMMDD` with a fractional day.
    DayAsDate,
    /// Raw values count `step`s since `base`.
    Since { step: TimeStep, base: NaiveDateTime },
}

impl TimeUnits {
    /// Parses a units descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::UnrecognizedUnits`] for unknown forms and
    /// [`TimeError::InvalidBaseDate`] when the reference date is malformed.
    pub fn parse(units: &str) -> Result<Self, TimeError> {
        let trimmed = units.trim();
        if trimmed.starts_with("day as %Y%m%d") {
            return Ok(Self::DayAsDate);
        }

        let unrecognized = || TimeError::UnrecognizedUnits {
            units: units.to_string(),
        };
        let (head, tail) = trimmed.split_once(" since ").ok_or_else(unrecognized)?;
        let step = TimeStep::parse(head.trim()).ok_or_else(unrecognized)?;
        let base = parse_base_date(tail)?;
        Ok(Self::Since { step, base })
    }
}

impl FromStr for TimeUnits {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Parses the reference date of a `since` descriptor.
pub(crate) fn parse_base_date(text: &str) -> Result<NaiveDateTime, TimeError> {
    let invalid = || TimeError::InvalidBaseDate {
        value: text.to_string(),
    };

    let mut s = text.trim();
    for suffix in ["UTC", "Z"] {
        if let Some(stripped) = s.strip_suffix(suffix) {
            s = stripped.trim_end();
            break;
        }
    }
    let s = s.replacen('T', " ", 1);
    let mut parts = s.split_whitespace();

    let date_part = parts.next().ok_or_else(invalid)?;
    let mut ymd = date_part.split('-');
    let year: i32 = ymd.next().and_then(|v| v.parse().ok()).ok_or_else(invalid)?;
    let month: u32 = ymd.next().and_then(|v| v.parse().ok()).ok_or_else(invalid)?;
    let day: u32 = ymd.next().and_then(|v| v.parse().ok()).ok_or_else(invalid)?;
    if ymd.next().is_some() {
        return Err(invalid());
    }
    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;

    let time = match parts.next() {
        None => NaiveTime::MIN,
        Some(clock) => parse_clock(clock).ok_or_else(invalid)?,
    };
    if parts.next().is_some() {
        return Err(invalid());
    }
    Ok(date.and_time(time))
}

fn parse_clock(clock: &str) -> Option<NaiveTime> {
    let mut fields = clock.split(':');
    let hour: u32 = fields.next()?.parse().ok()?;
    let minute: u32 = fields.next()?.parse().ok()?;
    let seconds: f64 = match fields.next() {
        Some(s) => s.parse().ok()?,
        None => 0.0,
    };
    if fields.next().is_some() || !(0.0..60.0).contains(&seconds) {
        return None;
    }
    let whole = seconds.trunc();
    let nanos = ((seconds - whole) * 1e9).round() as u32;
    NaiveTime::from_hms_nano_opt(hour, minute, whole as u32, nanos.min(999_999_999))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn ymd_hms(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn parse_day_as_date() {
        assert_eq!(TimeUnits::parse("day as %Y%m%d.%f").unwrap(), TimeUnits::DayAsDate);
        assert_eq!(TimeUnits::parse("day as %Y%m%d.f").unwrap(), TimeUnits::DayAsDate);
    }

    #[test]
    fn parse_days_since_date_only() {
        let units = TimeUnits::parse("days since 1950-01-01").unwrap();
        assert_eq!(
            units,
            TimeUnits::Since {
                step: TimeStep::Days,
                base: ymd_hms(1950, 1, 1, 0, 0, 0)
            }
        );
    }

    #[test]
    fn parse_hours_since_with_clock() {
        let units: TimeUnits = "hours since 1900-1-1 00:00:0.0".parse().unwrap();
        assert_eq!(
            units,
            TimeUnits::Since {
                step: TimeStep::Hours,
                base: ymd_hms(1900, 1, 1, 0, 0, 0)
            }
        );
    }

    #[test]
    fn parse_iso_separator_and_zone() {
        let units = TimeUnits::parse("months since 2001-06-15T12:30:00Z").unwrap();
        assert_eq!(
            units,
            TimeUnits::Since {
                step: TimeStep::Months,
                base: ymd_hms(2001, 6, 15, 12, 30, 0)
            }
        );
        let units = TimeUnits::parse("days since 2001-06-15 03:00 UTC").unwrap();
        match units {
            TimeUnits::Since { base, .. } => assert_eq!(base.hour(), 3),
            other => panic!("unexpected units {other:?}"),
        }
    }

    #[test]
    fn unknown_step_is_unrecognized() {
        assert!(matches!(
            TimeUnits::parse("seconds since 2000-01-01"),
            Err(TimeError::UnrecognizedUnits { .. })
        ));
        assert!(matches!(
            TimeUnits::parse("julian"),
            Err(TimeError::UnrecognizedUnits { .. })
        ));
    }

    #[test]
    fn malformed_base_date() {
        assert!(matches!(
            TimeUnits::parse("days since 2000-13-01"),
            Err(TimeError::InvalidBaseDate { .. })
        ));
        assert!(matches!(
            TimeUnits::parse("days since yesterday"),
            Err(TimeError::InvalidBaseDate { .. })
        ));
        assert!(matches!(
            TimeUnits::parse("days since 2000-01-01 25:00"),
            Err(TimeError::InvalidBaseDate { .. })
        ));
    }
}
