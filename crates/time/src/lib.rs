//! # cmbs-time
//!
//! Decoding of time axes into timestamps, plus calendar helpers.
//!
//! Timestamps are `f64` days since 1970-01-01T00:00 on the proleptic
//! Gregorian calendar.
//!
//! ## Architecture
//!
//! ```mermaid
//! graph LR
//!     A["units string"] -->|"TimeUnits::parse()"| B["TimeUnits"]
//!     B -->|".resolve(raw)"| C["timestamps"]
//!     C -->|"year_of() / month_of()"| D["calendar fields"]
//!     C -->|"replace_day_month()"| C
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use cmbs_time::{resolve_time, years};
//!
//! let time = resolve_time(Some("months since 2000-01-01"), &[0.0, 1.0, 2.0])?;
//! let y = years(&time)?; // [2000, 2000, 2000]
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `units` | Units descriptor parsing |
//! | `resolve` | Raw values to timestamps |
//! | `calendar` | Timestamp and calendar conversions |
//! | `error` | Error types |

mod calendar;
mod error;
mod resolve;
mod units;

pub use calendar::{
    datetime_from_timestamp, month_of, months, replace_day_month, timestamp_from_datetime,
    timestamp_from_ymd, year_of, years,
};
pub use error::TimeError;
pub use resolve::resolve_time;
pub use units::{TimeStep, TimeUnits};
