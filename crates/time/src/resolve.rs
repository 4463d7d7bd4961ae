//! Raw time values to timestamps.

use chrono::{Months, NaiveDate, NaiveDateTime};

use crate::calendar::timestamp_from_datetime;
use crate::error::TimeError;
use crate::units::{TimeStep, TimeUnits};

/// Tolerance for deciding whether a month offset is integral.
const MONTH_TOLERANCE: f64 = 1e-6;

/// Resolves raw time values against their units descriptor.
///
/// Returns timestamps in days since 1970-01-01T00:00.
///
/// # Errors
///
/// Returns [`TimeError::MissingUnits`] when `units` is `None`, and any error
/// of [`TimeUnits::parse`] or [`TimeUnits::resolve`].
pub fn resolve_time(units: Option<&str>, raw: &[f64]) -> Result<Vec<f64>, TimeError> {
    let units = units.ok_or(TimeError::MissingUnits)?;
    TimeUnits::parse(units)?.resolve(raw)
}

impl TimeUnits {
    /// Converts raw values in these units to timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::NonFiniteValue`] for NaN or infinite raw values,
    /// [`TimeError::InvalidDayValue`] for undecodable `YYYYMMDD.f` values, and
    /// the month-stride errors for irregular monthly axes.
    pub fn resolve(&self, raw: &[f64]) -> Result<Vec<f64>, TimeError> {
        if let Some(index) = raw.iter().position(|v| !v.is_finite()) {
            return Err(TimeError::NonFiniteValue { index });
        }
        match *self {
            Self::DayAsDate => raw.iter().map(|&v| day_as_date(v)).collect(),
            Self::Since { step: TimeStep::Hours, base } => Ok(linear(raw, 24.0, base)),
            Self::Since { step: TimeStep::Days, base } => Ok(linear(raw, 1.0, base)),
            Self::Since { step: TimeStep::Months, base } => monthly(raw, base),
        }
    }
}

fn day_as_date(value: f64) -> Result<f64, TimeError> {
    let invalid = || TimeError::InvalidDayValue { value };
    if value < 0.0 {
        return Err(invalid());
    }
    let whole = value.floor();
    let ymd = whole as i64;
    let year = i32::try_from(ymd / 10_000).map_err(|_| invalid())?;
    let month = ((ymd / 100) % 100) as u32;
    let day = (ymd % 100) as u32;
    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;

    // Fraction of a day, truncated to whole hours.
    let hours = (((value - whole) * 24.0) + 1e-9).floor().clamp(0.0, 23.0) as u32;
    let dt = date.and_hms_opt(hours, 0, 0).ok_or_else(invalid)?;
    Ok(timestamp_from_datetime(dt))
}

fn linear(raw: &[f64], per_day: f64, base: NaiveDateTime) -> Vec<f64> {
    let offset = timestamp_from_datetime(base);
    raw.iter().map(|&v| v / per_day + offset).collect()
}

fn whole_months(value: f64) -> Option<i64> {
    let rounded = value.round();
    ((value - rounded).abs() <= MONTH_TOLERANCE).then_some(rounded as i64)
}

fn shift_months(dt: NaiveDateTime, months: i64) -> Option<NaiveDateTime> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        dt.checked_add_months(magnitude)
    } else {
        dt.checked_sub_months(magnitude)
    }
}

/// Rebuilds a monthly axis by stepping whole months from `base + raw[0]`.
fn monthly(raw: &[f64], base: NaiveDateTime) -> Result<Vec<f64>, TimeError> {
    let Some(&first) = raw.first() else {
        return Ok(Vec::new());
    };
    let first_offset =
        whole_months(first).ok_or(TimeError::NonIntegerMonthOffset { value: first })?;

    let stride = match raw.get(1) {
        Some(&second) => {
            let step = second - first;
            match whole_months(step) {
                Some(s) if s >= 1 => s,
                _ => return Err(TimeError::InvalidMonthStride { stride: step }),
            }
        }
        None => 1,
    };

    for (index, pair) in raw.windows(2).enumerate().skip(1) {
        let got = pair[1] - pair[0];
        if (got - stride as f64).abs() > MONTH_TOLERANCE {
            return Err(TimeError::NonUniformMonthStride {
                index,
                expected: stride as f64,
                got,
            });
        }
    }

    let overflow = TimeError::OutOfRange { value: first };
    let start = shift_months(base, first_offset).ok_or(overflow.clone())?;
    (0..raw.len())
        .map(|i| {
            let dt = shift_months(start, i as i64 * stride).ok_or(overflow.clone())?;
            Ok(timestamp_from_datetime(dt))
        })
        .collect()
}
