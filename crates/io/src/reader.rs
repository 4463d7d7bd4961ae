//! The reader abstraction consumed by the ingestion pipeline.

use ndarray::{ArrayD, IxDyn};

use crate::error::IoError;

// ---------------------------------------------------------------------------
// Read results
// ---------------------------------------------------------------------------

/// Packing attributes of a stored variable: `value * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleOffset {
    pub scale: f64,
    pub offset: f64,
}

impl Default for ScaleOffset {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: 0.0,
        }
    }
}

impl ScaleOffset {
    pub fn apply(&self, value: f64) -> f64 {
        value * self.scale + self.offset
    }
}

/// Raw values of a source's time variable and its units attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTime {
    pub values: Vec<f64>,
    pub units: Option<String>,
}

impl RawTime {
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            units: None,
        }
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }
}

/// A variable as stored in a source, before masking and unpacking.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadResult {
    /// Row-major values.
    pub values: Vec<f64>,
    pub shape: Vec<usize>,
    pub fill_value: Option<f64>,
    pub scale_offset: ScaleOffset,
    pub units: Option<String>,
    /// The source's time axis, if it has one.
    pub time: Option<RawTime>,
}

impl ReadResult {
    /// A plain variable with no packing, fill value, units or time.
    pub fn new(values: Vec<f64>, shape: Vec<usize>) -> Self {
        Self {
            values,
            shape,
            fill_value: None,
            scale_offset: ScaleOffset::default(),
            units: None,
            time: None,
        }
    }

    pub fn with_fill_value(mut self, fill_value: f64) -> Self {
        self.fill_value = Some(fill_value);
        self
    }

    pub fn with_scale_offset(mut self, scale: f64, offset: f64) -> Self {
        self.scale_offset = ScaleOffset { scale, offset };
        self
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn with_time(mut self, time: RawTime) -> Self {
        self.time = Some(time);
        self
    }

    /// The values as an array of `shape`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::DimensionMismatch`] if the number of values does
    /// not match the shape.
    pub fn to_array(&self, name: &str) -> Result<ArrayD<f64>, IoError> {
        let expected: usize = self.shape.iter().product();
        if expected != self.values.len() {
            return Err(IoError::DimensionMismatch {
                name: name.to_string(),
                expected,
                got: self.values.len(),
            });
        }
        ArrayD::from_shape_vec(IxDyn(&self.shape), self.values.clone()).map_err(|e| {
            IoError::DimensionMismatch {
                name: format!("{name}: {e}"),
                expected,
                got: self.values.len(),
            }
        })
    }
}

// ---------------------------------------------------------------------------
// GridReader
// ---------------------------------------------------------------------------

/// Access to named variables in a data source.
pub trait GridReader {
    /// Reads `variable` from `source`.
    ///
    /// 4-D variables `(time, level, y, x)` are reduced to `level`.
    ///
    /// Returns `Ok(None)` when the source exists but lacks the variable.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::FileNotFound`] or [`IoError::ResourceNotFound`]
    /// when the source itself is missing, [`IoError::MissingLevel`] and
    /// [`IoError::InvalidLevel`] for 4-D variables, plus any backend error.
    fn read(
        &self,
        source: &str,
        variable: &str,
        level: Option<usize>,
    ) -> Result<Option<ReadResult>, IoError>;
}

/// Reduces a `(time, level, y, x)` buffer to a single level.
///
/// Buffers of rank 3 or less are returned unchanged.
pub(crate) fn select_level(
    name: &str,
    values: Vec<f64>,
    shape: Vec<usize>,
    level: Option<usize>,
) -> Result<(Vec<f64>, Vec<usize>), IoError> {
    match shape.len() {
        0..=3 => Ok((values, shape)),
        4 => {
            let level = level.ok_or_else(|| IoError::MissingLevel {
                name: name.to_string(),
            })?;
            let (nt, nl, ny, nx) = (shape[0], shape[1], shape[2], shape[3]);
            if level >= nl {
                return Err(IoError::InvalidLevel {
                    name: name.to_string(),
                    level,
                    n_levels: nl,
                });
            }
            let plane = ny * nx;
            if values.len() != nt * nl * plane {
                return Err(IoError::DimensionMismatch {
                    name: name.to_string(),
                    expected: nt * nl * plane,
                    got: values.len(),
                });
            }
            let selected = (0..nt)
                .flat_map(|t| {
                    let start = (t * nl + level) * plane;
                    values[start..start + plane].iter().copied()
                })
                .collect();
            Ok((selected, vec![nt, ny, nx]))
        }
        ndim => Err(IoError::UnsupportedRank {
            name: name.to_string(),
            ndim,
        }),
    }
}
