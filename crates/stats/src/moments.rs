//! First and second moments of already selected samples.

/// Mean of `samples`; 0.0 for an empty slice.
pub fn mean(samples: &[f64]) -> f64 {
    match samples.len() {
        0 => 0.0,
        n => samples.iter().sum::<f64>() / n as f64,
    }
}

/// Population variance (`ddof = 0`); 0.0 for an empty slice.
pub fn population_variance(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let m = mean(samples);
    let ss: f64 = samples.iter().map(|&v| (v - m).powi(2)).sum();
    ss / samples.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_of_samples() {
        assert_relative_eq!(mean(&[1.5, 2.5, 6.0]), 10.0 / 3.0, epsilon = 1e-12);
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn population_variance_matches_numpy() {
        // numpy.var([1, 3, 5, 11]) = 14.0
        assert_relative_eq!(population_variance(&[1.0, 3.0, 5.0, 11.0]), 14.0, epsilon = 1e-12);
    }

    #[test]
    fn degenerate_variance_is_zero() {
        assert_eq!(population_variance(&[3.5]), 0.0);
        assert_eq!(population_variance(&[]), 0.0);
    }
}
