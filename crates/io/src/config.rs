//! Configuration of the ingestion pipeline.

use ndarray::ArrayD;

use crate::error::IoError;
use crate::validate::ValidationCollector;

/// What to read and how to prepare it.
///
/// Use the builder methods (`with_*`) to customise the load; only the
/// variable name is required.
///
/// # Example
///
/// ```
/// use cmbs_io::LoadConfig;
///
/// let config = LoadConfig::new("tas")
///     .with_coordinates("lat", "lon")
///     .with_shift_lon(true)
///     .with_time_cycle(12);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct LoadConfig {
    variable: String,
    lat_name: Option<String>,
    lon_name: Option<String>,
    /// Unit-conversion factor applied after unpacking.
    scale_factor: f64,
    label: Option<String>,
    unit: Option<String>,
    shift_lon: bool,
    start_time: Option<f64>,
    stop_time: Option<f64>,
    /// Spatial validity mask, `true` = keep.
    mask: Option<ArrayD<bool>>,
    time_cycle: Option<usize>,
    squeeze: bool,
    level: Option<usize>,
}

impl LoadConfig {
    /// Creates a configuration reading `variable` with defaults.
    ///
    /// Defaults: no coordinates, `scale_factor = 1.0`, label and unit taken
    /// from the source, no longitude shift, no subsetting, no input mask, no
    /// time cycle, no squeezing, no level.
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            lat_name: None,
            lon_name: None,
            scale_factor: 1.0,
            label: None,
            unit: None,
            shift_lon: false,
            start_time: None,
            stop_time: None,
            mask: None,
            time_cycle: None,
            squeeze: false,
            level: None,
        }
    }

    /// Sets the latitude and longitude variable names.
    pub fn with_coordinates(mut self, lat: impl Into<String>, lon: impl Into<String>) -> Self {
        self.lat_name = Some(lat.into());
        self.lon_name = Some(lon.into());
        self
    }

    /// Sets the unit-conversion factor (e.g. `1.0 / 24.0` for mm/h to
    /// mm/day). Unrelated to the packing `scale_factor` attribute.
    pub fn with_scale_factor(mut self, factor: f64) -> Self {
        self.scale_factor = factor;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Overrides the unit found in the source.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Converts longitudes to `[-180, 180)` after reading.
    pub fn with_shift_lon(mut self, shift: bool) -> Self {
        self.shift_lon = shift;
        self
    }

    /// Restricts the loaded series to `[start, stop]` (timestamps).
    pub fn with_time_range(mut self, start: f64, stop: f64) -> Self {
        self.start_time = Some(start);
        self.stop_time = Some(stop);
        self
    }

    /// Sets a spatial validity mask (`true` = keep) applied after reading.
    pub fn with_mask(mut self, mask: ArrayD<bool>) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Sets the samples per cycle; enables the full-record climatology.
    pub fn with_time_cycle(mut self, cycle: usize) -> Self {
        self.time_cycle = Some(cycle);
        self
    }

    pub fn with_squeeze(mut self, squeeze: bool) -> Self {
        self.squeeze = squeeze;
        self
    }

    /// Selects a level of a 4-D variable.
    pub fn with_level(mut self, level: usize) -> Self {
        self.level = Some(level);
        self
    }

    // --- Accessors ---

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn lat_name(&self) -> Option<&str> {
        self.lat_name.as_deref()
    }

    pub fn lon_name(&self) -> Option<&str> {
        self.lon_name.as_deref()
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn shift_lon(&self) -> bool {
        self.shift_lon
    }

    pub fn start_time(&self) -> Option<f64> {
        self.start_time
    }

    pub fn stop_time(&self) -> Option<f64> {
        self.stop_time
    }

    pub fn mask(&self) -> Option<&ArrayD<bool>> {
        self.mask.as_ref()
    }

    pub fn time_cycle(&self) -> Option<usize> {
        self.time_cycle
    }

    pub fn squeeze(&self) -> bool {
        self.squeeze
    }

    pub fn level(&self) -> Option<usize> {
        self.level
    }

    /// Validate that the configuration is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Validation`] listing every problem found: an
    /// empty variable name, a non-finite scale factor, a non-finite or
    /// inverted time range, or a zero time cycle.
    pub fn validate(&self) -> Result<(), IoError> {
        let mut c = ValidationCollector::new();
        c.check(self.variable.trim().is_empty(), || {
            "variable name must not be empty".into()
        });
        c.check(!self.scale_factor.is_finite(), || {
            format!("scale_factor must be finite, got {}", self.scale_factor)
        });
        if let (Some(start), Some(stop)) = (self.start_time, self.stop_time) {
            c.check(!start.is_finite() || !stop.is_finite(), || {
                format!("time range must be finite, got {start}..{stop}")
            });
            c.check(stop < start, || {
                format!("stop_time {stop} is before start_time {start}")
            });
        }
        c.check(self.time_cycle == Some(0), || {
            "time_cycle must be positive".into()
        });
        c.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = LoadConfig::new("tas");
        assert_eq!(c.variable(), "tas");
        assert_eq!(c.scale_factor(), 1.0);
        assert!(c.lat_name().is_none());
        assert!(!c.shift_lon());
        assert!(!c.squeeze());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn all_problems_are_reported() {
        let c = LoadConfig::new("")
            .with_scale_factor(f64::INFINITY)
            .with_time_range(10.0, 5.0)
            .with_time_cycle(0);
        match c.validate() {
            Err(IoError::Validation { count, .. }) => assert_eq!(count, 4),
            other => panic!("expected Validation, got {other:?}"),
        }
    }
}
