//! # cmbs-stats
//!
//! Scalar statistics on `f64` slices. Used by the grid crates for every
//! per-cell reduction, so all functions work on plain slices of already
//! selected (valid) samples.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `moments` | Mean and population variance |
//! | `quantile` | Type-7 quantiles |
//! | `correlation` | Pearson correlation and its significance |
//! | `fit` | Ordinary least-squares line fit |

mod correlation;
mod fit;
mod moments;
mod quantile;

pub use correlation::{correlation_significance, pearson_correlation};
pub use fit::{LinearFit, linear_regression};
pub use moments::{mean, population_variance};
pub use quantile::quantile_type7;
