//! Configuration for per-cell regressions.

use crate::error::RegressError;

/// Configuration shared by correlation, regression and detrending.
///
/// # Example
///
/// ```
/// use cmbs_regress::RegressionConfig;
///
/// let config = RegressionConfig::new()
///     .with_threshold(0.05)
///     .with_parallel(false);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct RegressionConfig {
    threshold: f64,
    min_samples: usize,
    parallel: bool,
}

impl RegressionConfig {
    /// Creates a new configuration with defaults.
    ///
    /// Defaults: `threshold = 1.01` (no significance masking),
    /// `min_samples = 3`, `parallel = true`.
    pub fn new() -> Self {
        Self {
            threshold: 1.01,
            min_samples: 3,
            parallel: true,
        }
    }

    /// Sets the p-value above which results are masked.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets the minimum number of jointly valid samples per cell.
    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    /// Enables or disables rayon parallelism over cells.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    // --- Accessors ---

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// Validates this configuration.
    ///
    /// The threshold must be finite and non-negative and `min_samples` at
    /// least 3.
    pub fn validate(&self) -> Result<(), RegressError> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(RegressError::InvalidConfig {
                reason: format!(
                    "threshold must be finite and non-negative, got {}",
                    self.threshold
                ),
            });
        }
        if self.min_samples < 3 {
            return Err(RegressError::InvalidConfig {
                reason: format!("min_samples must be at least 3, got {}", self.min_samples),
            });
        }
        Ok(())
    }

    /// Whether a result with p-value `p` is masked.
    pub(crate) fn rejects(&self, p: f64) -> bool {
        p.is_nan() || p > self.threshold
    }
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = RegressionConfig::default();
        assert_eq!(c.threshold(), 1.01);
        assert_eq!(c.min_samples(), 3);
        assert!(c.parallel());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn too_few_samples_rejected() {
        let c = RegressionConfig::new().with_min_samples(2);
        assert!(matches!(
            c.validate(),
            Err(RegressError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn nan_threshold_rejected() {
        assert!(RegressionConfig::new().with_threshold(f64::NAN).validate().is_err());
    }

    #[test]
    fn default_threshold_masks_nothing() {
        let c = RegressionConfig::new();
        assert!(!c.rejects(1.0));
        assert!(c.rejects(f64::NAN));
        assert!(RegressionConfig::new().with_threshold(0.05).rejects(0.06));
    }
}
