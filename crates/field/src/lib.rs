//! # cmbs-field
//!
//! Masked geophysical grid fields: a numeric buffer of rank 1 to 3, a
//! validity mask of the same shape, and the coordinate and time metadata
//! that goes with them.
//!
//! Geometry is derived from rank and time presence:
//!
//! | Rank | Time | Geometry | Axes |
//! |------|------|----------|------|
//! | 3 | yes | `Cube` | `(time, y, x)` |
//! | 2 | yes | `PointSeries` | `(time, point)` |
//! | 2 | no | `Map` | `(y, x)` |
//! | 1 | yes | `Series` | `(time)` |
//! | 1 | no | `Points` | `(point)` |
//!
//! ## Architecture
//!
//! ```mermaid
//! graph LR
//!     A["MaskedGridField"] -->|"apply_mask() / apply_region_mask()"| A
//!     A -->|"subset_time() / region_subset()"| A
//!     A -->|"climatology() / deseasonalized_anomaly()"| B["temporal products"]
//!     A -->|"fldmean() / zonal_statistics()"| C["spatial reductions"]
//!     A -->|"add() / sub() / mul() / div()"| A
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use cmbs_field::{AnomalyBase, MaskedGridField};
//!
//! let mut field = MaskedGridField::new(data, mask)?
//!     .with_time(time)?
//!     .with_time_cycle(12);
//! field.cache_climatology()?;
//! let recent = field.subset_time(Some(start), Some(stop))?;
//! let anomaly = recent.deseasonalized_anomaly(AnomalyBase::All)?;
//! let mean_series = anomaly.fldmean()?;
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `field` | The field container, metadata and shape operations |
//! | `geometry` | Geometry classification and broadcast rules |
//! | `arith` | Element-wise arithmetic with mask propagation |
//! | `subset` | Temporal subsetting |
//! | `mask` | Validity-mask application and summaries |
//! | `region` | Index and lat/lon regions |
//! | `aggregate` | Weighted, field-mean and zonal reductions |
//! | `temporal` | Climatology, anomalies, yearly and whole-record statistics |
//! | `error` | Error types |

mod aggregate;
mod arith;
mod error;
mod field;
mod geometry;
mod mask;
mod region;
mod subset;
mod temporal;

pub use aggregate::ReduceOp;
pub use error::FieldError;
pub use field::{LonConvention, MaskedGridField};
pub use geometry::{Broadcast, Geometry, resolve_broadcast};
pub use region::{Region, RegionBounds};
pub use temporal::{AnomalyBase, YearlyAggregate};
