//! Cell-by-cell correlation of two fields.

use cmbs_field::MaskedGridField;
use cmbs_stats::{correlation_significance, pearson_correlation};
use ndarray::Zip;
use tracing::{debug, instrument};

use crate::cells::{candidate_cells, cell_field, map_cells};
use crate::config::RegressionConfig;
use crate::error::RegressError;

/// Pearson correlation of two fields per cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationResult {
    /// Correlation coefficient, masked where the p-value exceeds the
    /// threshold.
    pub coefficient: MaskedGridField,
    /// Two-sided p-value; not subject to threshold masking.
    pub p_value: MaskedGridField,
}

#[derive(Debug, Clone, Copy)]
struct CellCorrelation {
    r: f64,
    p: f64,
}

/// Correlates `x` and `y` along time for every cell.
///
/// Each cell uses only the time steps valid in both fields. Cells with fewer
/// than `min_samples` joint samples or a constant series are invalid in
/// both outputs.
///
/// # Errors
///
/// Returns [`RegressError::DimensionMismatch`] for differing shapes,
/// [`RegressError::UnsupportedGeometry`] without a time axis and
/// [`RegressError::InvalidConfig`] for an invalid `config`.
#[instrument(skip_all, fields(shape = ?x.shape()))]
pub fn correlate(
    x: &MaskedGridField,
    y: &MaskedGridField,
    config: &RegressionConfig,
) -> Result<CorrelationResult, RegressError> {
    config.validate()?;
    if x.shape() != y.shape() {
        return Err(RegressError::DimensionMismatch {
            operation: "correlate",
            expected: x.shape().to_vec(),
            got: y.shape().to_vec(),
        });
    }
    let Some(nt) = x.nt() else {
        return Err(RegressError::UnsupportedGeometry {
            operation: "correlate",
            ndim: x.ndim(),
        });
    };

    let (xd, xm) = x.flatten_spatial();
    let (yd, ym) = y.flatten_spatial();
    let invalid = Zip::from(&xm).and(&ym).map_collect(|&a, &b| a || b);
    let selected = candidate_cells(&invalid, config.min_samples());

    let results = map_cells(x.n_cells(), &selected, config.parallel(), |cell| {
        let (xs, ys): (Vec<f64>, Vec<f64>) = (0..nt)
            .filter(|&t| !invalid[[t, cell]])
            .map(|t| (xd[[t, cell]], yd[[t, cell]]))
            .unzip();
        let r = pearson_correlation(&xs, &ys)?;
        let p = correlation_significance(r, xs.len())?;
        Some(CellCorrelation { r, p })
    });

    let fitted = results.iter().filter(|r| r.is_some()).count();
    debug!(cells = results.len(), candidates = selected.len(), fitted, "correlation");

    let mut coefficient = cell_field(x, &results, |c| c.r, |c| config.rejects(c.p))?;
    coefficient.set_label(format!("correlation {} / {}", x.label(), y.label()));
    let mut p_value = cell_field(x, &results, |c| c.p, |_| false)?;
    p_value.set_label(format!("p-value {} / {}", x.label(), y.label()));
    Ok(CorrelationResult {
        coefficient,
        p_value,
    })
}
