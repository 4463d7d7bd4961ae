//! # cmbs-io
//!
//! Reading gridded variables and turning them into
//! [`MaskedGridField`](cmbs_field::MaskedGridField)s.
//!
//! Storage backends implement [`GridReader`]. [`MemoryReader`] serves
//! in-memory data; `NetcdfReader` reads NetCDF files and is available with
//! the `netcdf` cargo feature. [`load_field`] runs the ingestion pipeline
//! on top of any reader.
//!
//! ## Quick Start
//!
//! ```ignore
//! use cmbs_io::{LoadConfig, NetcdfReader, load_field};
//!
//! let config = LoadConfig::new("tas")
//!     .with_coordinates("lat", "lon")
//!     .with_time_cycle(12);
//! let field = load_field(&NetcdfReader::new(), "era_tas.nc", &config)?;
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `reader` | `GridReader` trait, read results, level selection |
//! | `memory` | In-memory reader |
//! | `netcdf_read` | NetCDF reader (feature `netcdf`) |
//! | `config` | `LoadConfig` builder |
//! | `load` | The ingestion pipeline |
//! | `validate` | Accumulated validation errors |
//! | `error` | Error types |

mod config;
mod error;
mod load;
mod memory;
#[cfg(feature = "netcdf")]
mod netcdf_read;
mod reader;
mod validate;

pub use config::LoadConfig;
pub use error::IoError;
pub use load::load_field;
pub use memory::MemoryReader;
#[cfg(feature = "netcdf")]
pub use netcdf_read::NetcdfReader;
pub use reader::{GridReader, RawTime, ReadResult, ScaleOffset};
