//! Ordinary least-squares fit of a straight line.

use crate::correlation::{centered_sums, correlation_significance, finite_pairs};

/// Result of fitting `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation of the fitted pairs.
    pub r: f64,
    /// Two-sided p-value for a non-zero slope (Student t, `n - 2` dof).
    pub p_value: f64,
    /// Standard error of the slope.
    pub std_err: f64,
    /// Number of pairs used in the fit.
    pub n: usize,
}

/// Fits a straight line through the finite `(x, y)` pairs.
///
/// A constant `y` gives slope 0 and `r = 0`. Returns `None` if fewer than 3
/// finite pairs remain or if `x` is constant.
pub fn linear_regression(x: &[f64], y: &[f64]) -> Option<LinearFit> {
    let pairs = finite_pairs(x, y);
    let n = pairs.len();
    if n < 3 {
        return None;
    }

    let (sxx, syy, sxy) = centered_sums(&pairs);
    if sxx == 0.0 {
        return None;
    }

    let nf = n as f64;
    let mx = pairs.iter().map(|(xi, _)| xi).sum::<f64>() / nf;
    let my = pairs.iter().map(|(_, yi)| yi).sum::<f64>() / nf;

    let slope = sxy / sxx;
    let intercept = my - slope * mx;
    let r = if syy == 0.0 {
        0.0
    } else {
        (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
    };
    let p_value = correlation_significance(r, n)?;
    let df = nf - 2.0;
    let std_err = ((1.0 - r * r).max(0.0) * syy / sxx / df).sqrt();

    Some(LinearFit {
        slope,
        intercept,
        r,
        p_value,
        std_err,
        n,
    })
}
