//! Spatial reductions.

use ndarray::{Array2, ArrayD, Axis, IxDyn};

use crate::error::FieldError;
use crate::field::MaskedGridField;
use crate::geometry::Geometry;

/// Reduction applied over valid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    Mean,
    Sum,
}

/// Weights zeroed at invalid cells and renormalized to sum 1.
///
/// Returns `None` when no positive weight mass remains.
fn renormalized(weights: &[f64], invalid: impl Iterator<Item = bool>) -> Option<Vec<f64>> {
    let w: Vec<f64> = weights
        .iter()
        .zip(invalid)
        .map(|(&w, bad)| if bad || !w.is_finite() { 0.0 } else { w })
        .collect();
    let total: f64 = w.iter().sum();
    (total > 0.0).then(|| w.iter().map(|x| x / total).collect())
}

impl MaskedGridField {
    /// Weighted spatial reduction per time step.
    ///
    /// Per time step, weights at invalid cells are zeroed and the remainder
    /// renormalized to sum 1. `Sum` yields `Σ w·x`; `Mean` divides that by
    /// the number of valid cells. A step without valid weight mass is
    /// invalid in the output.
    ///
    /// Time-axis fields reduce to a series; a map reduces to a single value.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::UnsupportedGeometry`] for rank-1 fields and
    /// [`FieldError::DimensionMismatch`] if `weights` does not have the
    /// spatial shape.
    pub fn weighted_reduce(
        &self,
        weights: &ArrayD<f64>,
        op: ReduceOp,
    ) -> Result<MaskedGridField, FieldError> {
        if !(2..=3).contains(&self.ndim()) {
            return Err(FieldError::UnsupportedGeometry {
                operation: "weighted_reduce",
                ndim: self.ndim(),
            });
        }
        if weights.shape() != self.spatial_shape() {
            return Err(FieldError::DimensionMismatch {
                operation: "weighted_reduce",
                expected: self.spatial_shape().to_vec(),
                got: weights.shape().to_vec(),
            });
        }
        let w: Vec<f64> = weights.iter().copied().collect();
        let (data, mask) = self.flatten_spatial();

        let (values, invalid): (Vec<f64>, Vec<bool>) = data
            .outer_iter()
            .zip(mask.outer_iter())
            .map(|(row, row_mask)| {
                let n_valid = row_mask.iter().filter(|&&m| !m).count();
                match renormalized(&w, row_mask.iter().copied()) {
                    Some(nw) => {
                        let sum: f64 = row
                            .iter()
                            .zip(&nw)
                            .zip(row_mask.iter())
                            .filter(|(_, m)| !**m)
                            .map(|((x, w), _)| x * w)
                            .sum();
                        match op {
                            ReduceOp::Sum => (sum, false),
                            ReduceOp::Mean => (sum / n_valid as f64, false),
                        }
                    }
                    None => (f64::NAN, true),
                }
            })
            .unzip();

        self.per_step_output(values, invalid)
    }

    /// Unweighted mean of the valid cells per time step.
    pub fn fldmean(&self) -> Result<MaskedGridField, FieldError> {
        let (data, mask) = self.flatten_spatial();
        let (values, invalid): (Vec<f64>, Vec<bool>) = data
            .outer_iter()
            .zip(mask.outer_iter())
            .map(|(row, row_mask)| {
                let valid: Vec<f64> = row
                    .iter()
                    .zip(row_mask.iter())
                    .filter(|(_, m)| !**m)
                    .map(|(x, _)| *x)
                    .collect();
                if valid.is_empty() {
                    (f64::NAN, true)
                } else {
                    (cmbs_stats::mean(&valid), false)
                }
            })
            .unzip();
        self.per_step_output(values, invalid)
    }

    /// One value per time step: a series for time-axis fields, a single
    /// point otherwise.
    fn per_step_output(
        &self,
        values: Vec<f64>,
        invalid: Vec<bool>,
    ) -> Result<MaskedGridField, FieldError> {
        let n = values.len();
        let data = ArrayD::from_shape_vec(IxDyn(&[n]), values)?;
        let mask = ArrayD::from_shape_vec(IxDyn(&[n]), invalid)?;
        let mut out = MaskedGridField::new(data, mask)?.with_label(self.label());
        if let Some(unit) = self.unit() {
            out = out.with_unit(unit);
        }
        if self.geometry().has_time_axis() {
            if let Some(time) = self.time() {
                out = out.with_time(time.to_vec())?;
            }
            if let Some(cycle) = self.time_cycle() {
                out = out.with_time_cycle(cycle);
            }
        }
        Ok(out)
    }

    /// Reduction along the x axis of a grid.
    ///
    /// With `weights` (grid shaped), weights are renormalized per time step
    /// over the valid cells of the whole grid and the reduction is forced to
    /// a weighted sum. Rows without valid cells are invalid.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::UnsupportedGeometry`] for fields without a
    /// `(y, x)` grid and [`FieldError::DimensionMismatch`] for misshaped
    /// weights.
    pub fn zonal_statistics(
        &self,
        weights: Option<&ArrayD<f64>>,
        op: ReduceOp,
    ) -> Result<MaskedGridField, FieldError> {
        let geometry = self.geometry();
        if !geometry.has_grid() {
            return Err(FieldError::UnsupportedGeometry {
                operation: "zonal_statistics",
                ndim: self.ndim(),
            });
        }
        let spatial = self.spatial_shape();
        let (ny, nx) = (spatial[0], spatial[1]);
        if let Some(w) = weights
            && w.shape() != spatial
        {
            return Err(FieldError::DimensionMismatch {
                operation: "zonal_statistics",
                expected: spatial.to_vec(),
                got: w.shape().to_vec(),
            });
        }
        let op = if weights.is_some() { ReduceOp::Sum } else { op };
        let w: Option<Vec<f64>> = weights.map(|w| w.iter().copied().collect());

        let (data, mask) = self.flatten_spatial();
        let rows = data.nrows();
        let mut out = Array2::<f64>::from_elem((rows, ny), f64::NAN);
        let mut out_mask = Array2::from_elem((rows, ny), true);

        for (t, (row, row_mask)) in data.outer_iter().zip(mask.outer_iter()).enumerate() {
            let nw = match &w {
                Some(w) => match renormalized(w, row_mask.iter().copied()) {
                    Some(nw) => Some(nw),
                    None => continue,
                },
                None => None,
            };
            for y in 0..ny {
                let cells = (y * nx)..((y + 1) * nx);
                let valid: Vec<(usize, f64)> = cells
                    .filter(|&c| !row_mask[c])
                    .map(|c| (c, row[c]))
                    .collect();
                if valid.is_empty() {
                    continue;
                }
                let value = match (&nw, op) {
                    (Some(nw), _) => valid.iter().map(|&(c, x)| x * nw[c]).sum(),
                    (None, ReduceOp::Sum) => valid.iter().map(|&(_, x)| x).sum(),
                    (None, ReduceOp::Mean) => {
                        valid.iter().map(|&(_, x)| x).sum::<f64>() / valid.len() as f64
                    }
                };
                out[[t, y]] = value;
                out_mask[[t, y]] = false;
            }
        }

        let lat = self.lat().map(|lat| match lat.ndim() {
            2 => lat.index_axis(Axis(1), 0).to_owned(),
            _ => lat.clone(),
        });

        let (data, mask) = if geometry == Geometry::Cube {
            (out.into_dyn(), out_mask.into_dyn())
        } else {
            (
                out.index_axis_move(Axis(0), 0).into_dyn(),
                out_mask.index_axis_move(Axis(0), 0).into_dyn(),
            )
        };
        let mut result = MaskedGridField::new(data, mask)?.with_label(self.label());
        if let Some(unit) = self.unit() {
            result = result.with_unit(unit);
        }
        if geometry == Geometry::Cube
            && let Some(time) = self.time()
        {
            result = result.with_time(time.to_vec())?;
        }
        result.set_coordinates(lat, None);
        Ok(result)
    }
}
