//! Regression of every cell against a single reference series.

use cmbs_field::MaskedGridField;
use cmbs_stats::{LinearFit, linear_regression};
use ndarray::{Array2, ArrayD};
use tracing::{debug, instrument};

use crate::cells::{candidate_cells, cell_field, map_cells};
use crate::config::RegressionConfig;
use crate::error::RegressError;

/// Per-cell results of [`corr_single`].
#[derive(Debug, Clone, PartialEq)]
pub struct SingleCorrelation {
    pub correlation: MaskedGridField,
    pub slope: MaskedGridField,
    pub intercept: MaskedGridField,
    /// Two-sided p-value; not subject to threshold masking.
    pub p_value: MaskedGridField,
    /// Placeholder with every cell invalid.
    pub covariance: MaskedGridField,
}

/// Regresses every cell of `field` on the reference series `x`.
///
/// The fit for a cell uses the time steps where the cell is valid and `x`
/// is finite. Correlation, slope and intercept are masked where the p-value
/// exceeds the threshold. `mask`, when given, is a spatial validity mask
/// (`true` = keep) applied to all outputs.
///
/// # Errors
///
/// Returns [`RegressError::UnsupportedGeometry`] without a time axis,
/// [`RegressError::DimensionMismatch`] if `x` does not have one value per
/// time step or `mask` does not fit the output,
/// [`RegressError::InsufficientValidSamples`] for series shorter than
/// `min_samples` and [`RegressError::InvalidConfig`] for an invalid
/// `config`.
#[instrument(skip_all, fields(shape = ?field.shape(), parallel = config.parallel()))]
pub fn corr_single(
    field: &MaskedGridField,
    x: &[f64],
    mask: Option<&ArrayD<bool>>,
    config: &RegressionConfig,
) -> Result<SingleCorrelation, RegressError> {
    config.validate()?;
    let Some(nt) = field.nt() else {
        return Err(RegressError::UnsupportedGeometry {
            operation: "corr_single",
            ndim: field.ndim(),
        });
    };
    if x.len() != nt {
        return Err(RegressError::DimensionMismatch {
            operation: "corr_single",
            expected: vec![nt],
            got: vec![x.len()],
        });
    }
    if nt < config.min_samples() {
        return Err(RegressError::InsufficientValidSamples {
            n: nt,
            min: config.min_samples(),
        });
    }

    let (data, data_mask) = field.flatten_spatial();
    let invalid = Array2::from_shape_fn(data_mask.raw_dim(), |(t, c)| {
        data_mask[[t, c]] || !x[t].is_finite()
    });
    let selected = candidate_cells(&invalid, config.min_samples());
    let results: Vec<Option<LinearFit>> =
        map_cells(field.n_cells(), &selected, config.parallel(), |cell| {
            let (xs, ys): (Vec<f64>, Vec<f64>) = (0..nt)
                .filter(|&t| !invalid[[t, cell]])
                .map(|t| (x[t], data[[t, cell]]))
                .unzip();
            linear_regression(&xs, &ys)
        });

    let fitted = results.iter().filter(|r| r.is_some()).count();
    debug!(
        cells = results.len(),
        candidates = selected.len(),
        fitted,
        "single-series regression"
    );

    let insignificant = |f: &LinearFit| config.rejects(f.p_value);
    let mut out = SingleCorrelation {
        correlation: cell_field(field, &results, |f| f.r, insignificant)?,
        slope: cell_field(field, &results, |f| f.slope, insignificant)?,
        intercept: cell_field(field, &results, |f| f.intercept, insignificant)?,
        p_value: cell_field(field, &results, |f| f.p_value, |_| false)?,
        covariance: cell_field(field, &results, |_| f64::NAN, |_| true)?,
    };
    for (part, name) in [
        (&mut out.correlation, "correlation"),
        (&mut out.slope, "slope"),
        (&mut out.intercept, "intercept"),
        (&mut out.p_value, "p-value"),
        (&mut out.covariance, "covariance"),
    ] {
        part.set_label(format!("{name} {}", field.label()));
        if let Some(valid) = mask {
            part.apply_mask(valid, true)?;
        }
    }
    Ok(out)
}
