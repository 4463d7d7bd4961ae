//! # cmbs-regress
//!
//! Per-cell statistics between masked grid fields: correlation of two
//! fields, regression against a reference series, and linear detrending.
//!
//! Every cell is processed independently, in parallel via rayon unless
//! [`RegressionConfig::with_parallel`] turns it off.
//!
//! ## Quick Start
//!
//! ```ignore
//! use cmbs_regress::{RegressionConfig, corr_single, detrend};
//!
//! let config = RegressionConfig::new().with_threshold(0.05);
//! let detrended = detrend(&field, &config)?;
//! let result = corr_single(&detrended, &index_series, None, &config)?;
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `config` | Significance threshold, minimum samples, parallelism |
//! | `valid` | Flattening and selection of valid cells |
//! | `correlate` | Field-to-field correlation |
//! | `single` | Field-to-series regression |
//! | `detrend` | Linear trend removal |
//! | `error` | Error types |

mod cells;
mod config;
mod correlate;
mod detrend;
mod error;
mod single;
mod valid;

pub use config::RegressionConfig;
pub use correlate::{CorrelationResult, correlate};
pub use detrend::{detrend, detrend_in_place};
pub use error::RegressError;
pub use single::{SingleCorrelation, corr_single};
pub use valid::{ValidData, ValidityMode, get_valid_data};
