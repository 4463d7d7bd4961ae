//! Order statistics.

/// Type-7 quantile of `samples` at `p` (linear interpolation between order
/// statistics, as `numpy.percentile` does by default).
///
/// The samples need not be sorted. Returns `None` for an empty slice or a
/// `p` outside `[0, 1]`.
pub fn quantile_type7(samples: &[f64], p: f64) -> Option<f64> {
    if samples.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);

    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    Some(sorted[lo] + (h - h.floor()) * (sorted[hi] - sorted[lo]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn quantile_matches_numpy() {
        // numpy.percentile(np.arange(1, 11), 30) = 3.7
        let samples: Vec<f64> = (1..=10).rev().map(f64::from).collect();
        assert_relative_eq!(quantile_type7(&samples, 0.3).unwrap(), 3.7, epsilon = 1e-10);
    }

    #[test]
    fn quantile_end_points_and_interpolation() {
        let samples = [5.0, 1.0, 3.0, 2.0, 4.0];
        assert_eq!(quantile_type7(&samples, 0.0), Some(1.0));
        assert_eq!(quantile_type7(&samples, 1.0), Some(5.0));
        assert_eq!(quantile_type7(&samples, 0.5), Some(3.0));
        // h = 0.4 between 1 and 2
        assert_relative_eq!(quantile_type7(&samples, 0.1).unwrap(), 1.4, epsilon = 1e-10);
    }

    #[test]
    fn quantile_of_nothing_is_none() {
        assert_eq!(quantile_type7(&[], 0.5), None);
        assert_eq!(quantile_type7(&[1.0, 2.0], 1.5), None);
        assert_eq!(quantile_type7(&[1.0, 2.0], f64::NAN), None);
    }
}
