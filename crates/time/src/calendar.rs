//! Conversions between timestamps and proleptic Gregorian dates.
//!
//! A timestamp is a fractional number of days since 1970-01-01T00:00.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

use crate::error::TimeError;

const SECONDS_PER_DAY: f64 = 86_400.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Converts a calendar date-time to days since the epoch.
pub fn timestamp_from_datetime(dt: NaiveDateTime) -> f64 {
    let utc = dt.and_utc();
    let seconds = utc.timestamp() as f64 + f64::from(utc.timestamp_subsec_nanos()) * 1e-9;
    seconds / SECONDS_PER_DAY
}

/// Converts days since the epoch to a calendar date-time.
///
/// The timestamp is rounded to the nearest millisecond first so that values
/// produced by [`timestamp_from_datetime`] map back onto the same instant.
/// Returns `None` for non-finite values or instants chrono cannot represent.
pub fn datetime_from_timestamp(ts: f64) -> Option<NaiveDateTime> {
    if !ts.is_finite() {
        return None;
    }
    let millis = (ts * MILLIS_PER_DAY).round();
    if millis.abs() > i64::MAX as f64 / 2.0 {
        return None;
    }
    let millis = millis as i64;
    let secs = millis.div_euclid(1000);
    let nanos = (millis.rem_euclid(1000) * 1_000_000) as u32;
    DateTime::from_timestamp(secs, nanos).map(|dt| dt.naive_utc())
}

/// Builds the timestamp of midnight on the given date.
///
/// # Errors
///
/// Returns [`TimeError::InvalidDate`] if the triple is not a calendar date.
pub fn timestamp_from_ymd(year: i32, month: u32, day: u32) -> Result<f64, TimeError> {
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or(TimeError::InvalidDate { year, month, day })?;
    Ok(timestamp_from_datetime(date.and_time(chrono::NaiveTime::MIN)))
}

fn to_datetime(ts: f64) -> Result<NaiveDateTime, TimeError> {
    datetime_from_timestamp(ts).ok_or(TimeError::OutOfRange { value: ts })
}

/// Calendar year of a timestamp.
pub fn year_of(ts: f64) -> Result<i32, TimeError> {
    Ok(to_datetime(ts)?.year())
}

/// Calendar month (1..=12) of a timestamp.
pub fn month_of(ts: f64) -> Result<u32, TimeError> {
    Ok(to_datetime(ts)?.month())
}

/// Calendar years of a series of timestamps.
pub fn years(time: &[f64]) -> Result<Vec<i32>, TimeError> {
    time.iter().map(|&t| year_of(t)).collect()
}

/// Calendar months of a series of timestamps.
pub fn months(time: &[f64]) -> Result<Vec<u32>, TimeError> {
    time.iter().map(|&t| month_of(t)).collect()
}

/// Replaces the day and/or month of a timestamp, keeping year and time of day.
///
/// # Errors
///
/// Returns [`TimeError::InvalidDate`] if the replacement does not exist
/// (e.g. day 31 in a 30-day month) and [`TimeError::OutOfRange`] if the input
/// timestamp is not representable.
pub fn replace_day_month(ts: f64, day: Option<u32>, month: Option<u32>) -> Result<f64, TimeError> {
    let dt = to_datetime(ts)?;
    let year = dt.year();
    let month = month.unwrap_or(dt.month());
    let day = day.unwrap_or(dt.day());
    let date =
        NaiveDate::from_ymd_opt(year, month, day).ok_or(TimeError::InvalidDate { year, month, day })?;
    Ok(timestamp_from_datetime(date.and_time(dt.time())))
}
