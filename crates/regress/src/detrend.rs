//! Removal of linear trends along time.

use cmbs_field::{FieldError, Geometry, MaskedGridField};
use cmbs_stats::linear_regression;
use ndarray::{Array2, IxDyn};
use tracing::{info, instrument};

use crate::cells::{candidate_cells, map_cells};
use crate::config::RegressionConfig;
use crate::error::RegressError;

/// Copy of a cube with each cell's linear trend removed.
///
/// The predictor is the time index `0..nt`. Cells without a fit (fewer
/// than `min_samples` valid samples) become invalid at every time step.
/// The significance threshold of `config` is not applied: every fitted
/// trend is removed.
///
/// # Errors
///
/// Returns [`RegressError::UnsupportedGeometry`] for anything but a cube
/// and [`RegressError::InvalidConfig`] for an invalid `config`.
pub fn detrend(
    field: &MaskedGridField,
    config: &RegressionConfig,
) -> Result<MaskedGridField, RegressError> {
    let mut out = field.clone();
    detrend_in_place(&mut out, config)?;
    Ok(out)
}

/// In-place variant of [`detrend`].
#[instrument(skip_all, fields(shape = ?field.shape()))]
pub fn detrend_in_place(
    field: &mut MaskedGridField,
    config: &RegressionConfig,
) -> Result<(), RegressError> {
    config.validate()?;
    if field.geometry() != Geometry::Cube {
        return Err(RegressError::UnsupportedGeometry {
            operation: "detrend",
            ndim: field.ndim(),
        });
    }
    let (data, mask) = field.flatten_spatial();
    let nt = data.nrows();
    let cells = data.ncols();
    let steps: Vec<f64> = (0..nt).map(|t| t as f64).collect();
    let selected = candidate_cells(&mask, config.min_samples());

    let trends = map_cells(cells, &selected, config.parallel(), |cell| {
        let (ts, ys): (Vec<f64>, Vec<f64>) = (0..nt)
            .filter(|&t| !mask[[t, cell]])
            .map(|t| (steps[t], data[[t, cell]]))
            .unzip();
        linear_regression(&ts, &ys).map(|f| (f.slope, f.intercept))
    });

    let residual = Array2::from_shape_fn((nt, cells), |(t, c)| match trends[c] {
        Some((slope, intercept)) => data[[t, c]] - (slope * steps[t] + intercept),
        None => f64::NAN,
    });
    let invalid = Array2::from_shape_fn((nt, cells), |(t, c)| {
        trends[c].is_none() || mask[[t, c]] || !residual[[t, c]].is_finite()
    });

    let shape = field.shape().to_vec();
    let residual = residual
        .into_shape_with_order(IxDyn(&shape))
        .map_err(FieldError::from)?;
    let invalid = invalid
        .into_shape_with_order(IxDyn(&shape))
        .map_err(FieldError::from)?;
    field.data_mut().assign(&residual);
    field.mask_mut().assign(&invalid);
    field.set_detrended(true);

    let fitted = trends.iter().filter(|t| t.is_some()).count();
    info!(cells, fitted, "detrended");
    Ok(())
}
