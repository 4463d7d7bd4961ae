//! Pearson correlation and its two-sided significance.

use statrs::distribution::{ContinuousCDF, StudentsT};

/// Pearson correlation coefficient.
///
/// Filters to indices where both `x[i]` and `y[i]` are finite.
/// Returns `None` if fewer than 3 finite pairs or if the denominator is zero
/// (constant input).
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    let pairs = finite_pairs(x, y);
    if pairs.len() < 3 {
        return None;
    }

    let (sxx, syy, sxy) = centered_sums(&pairs);
    let denom = (sxx * syy).sqrt();
    if denom == 0.0 {
        return None;
    }

    Some((sxy / denom).clamp(-1.0, 1.0))
}

/// Two-sided p-value of a correlation coefficient `r` computed from `n` pairs.
///
/// Uses `t = r * sqrt((n - 2) / (1 - r^2))` against a Student t
/// distribution with `n - 2` degrees of freedom. A perfect correlation has
/// p-value 0. Returns `None` if `n < 3` or `r` is not finite.
pub fn correlation_significance(r: f64, n: usize) -> Option<f64> {
    if n < 3 || !r.is_finite() {
        return None;
    }
    let r = r.clamp(-1.0, 1.0);
    let denom = 1.0 - r * r;
    if denom <= 0.0 {
        return Some(0.0);
    }
    let df = (n - 2) as f64;
    let t = r * (df / denom).sqrt();
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    Some((2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0))
}

pub(crate) fn finite_pairs(x: &[f64], y: &[f64]) -> Vec<(f64, f64)> {
    x.iter()
        .zip(y.iter())
        .filter(|(xi, yi)| xi.is_finite() && yi.is_finite())
        .map(|(xi, yi)| (*xi, *yi))
        .collect()
}

/// Returns `(Σdx², Σdy², Σdx·dy)` about the pair means.
pub(crate) fn centered_sums(pairs: &[(f64, f64)]) -> (f64, f64, f64) {
    let n = pairs.len() as f64;
    let mx: f64 = pairs.iter().map(|(xi, _)| xi).sum::<f64>() / n;
    let my: f64 = pairs.iter().map(|(_, yi)| yi).sum::<f64>() / n;

    let mut sum_xx = 0.0;
    let mut sum_yy = 0.0;
    let mut sum_xy = 0.0;
    for &(xi, yi) in pairs {
        let dx = xi - mx;
        let dy = yi - my;
        sum_xy += dx * dy;
        sum_xx += dx * dx;
        sum_yy += dy * dy;
    }
    (sum_xx, sum_yy, sum_xy)
}
