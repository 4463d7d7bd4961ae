//! Temporal aggregation: climatologies, anomalies, yearly and whole-record
//! reductions.

use std::collections::BTreeSet;

use cmbs_stats::{mean, population_variance, quantile_type7};
use cmbs_time::{months, timestamp_from_ymd, years};
use ndarray::{Array2, ArrayD, IxDyn};
use tracing::debug;

use crate::error::FieldError;
use crate::field::MaskedGridField;

/// Reference climatology for anomalies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnomalyBase {
    /// Climatology of the field as it is now.
    Current,
    /// Climatology cached from the full record before subsetting.
    All,
}

/// Per-year reduction of a field.
#[derive(Debug, Clone, PartialEq)]
pub struct YearlyAggregate {
    /// Sorted distinct calendar years.
    pub years: Vec<i32>,
    /// One time step per year, stamped at January 1.
    pub field: MaskedGridField,
}

/// Valid samples of column `cell` among `rows`.
fn valid_samples(
    data: &Array2<f64>,
    mask: &Array2<bool>,
    rows: impl Iterator<Item = usize>,
    cell: usize,
) -> Vec<f64> {
    rows.filter(|&t| !mask[[t, cell]])
        .map(|t| data[[t, cell]])
        .collect()
}

impl MaskedGridField {
    fn cycle(&self) -> Result<usize, FieldError> {
        match self.time_cycle() {
            Some(0) => Err(FieldError::InvalidTimeSpec {
                reason: "time_cycle must be positive".into(),
            }),
            Some(c) => Ok(c),
            None => Err(FieldError::InvalidTimeSpec {
                reason: "time_cycle is not set".into(),
            }),
        }
    }

    fn require_time_axis(&self, operation: &'static str) -> Result<usize, FieldError> {
        self.nt().ok_or(FieldError::UnsupportedGeometry {
            operation,
            ndim: self.ndim(),
        })
    }

    /// Mean periodic pattern with exactly `time_cycle` samples.
    ///
    /// Sample `i` averages the valid samples at `i, i + cycle, ...`. Phases
    /// without a valid sample are invalid.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidTimeSpec`] without a (positive) time
    /// cycle and [`FieldError::UnsupportedGeometry`] without a time axis.
    pub fn climatology(&self) -> Result<MaskedGridField, FieldError> {
        let cycle = self.cycle()?;
        let nt = self.require_time_axis("climatology")?;
        let (data, mask) = self.flatten_spatial();
        let cells = self.n_cells();

        let mut values = Vec::with_capacity(cycle * cells);
        let mut invalid = Vec::with_capacity(cycle * cells);
        for phase in 0..cycle {
            for cell in 0..cells {
                let samples = valid_samples(&data, &mask, (phase..nt).step_by(cycle), cell);
                if samples.is_empty() {
                    values.push(f64::NAN);
                    invalid.push(true);
                } else {
                    values.push(mean(&samples));
                    invalid.push(false);
                }
            }
        }

        let shape = self.shape_with_rows(cycle);
        let time = self
            .time()
            .filter(|t| t.len() >= cycle)
            .map(|t| t[..cycle].to_vec());
        let mut out = self.temporal_field(
            ArrayD::from_shape_vec(IxDyn(&shape), values)?,
            ArrayD::from_shape_vec(IxDyn(&shape), invalid)?,
            time,
        )?;
        out.set_label(format!("{} climatology", self.label()));
        debug!(cycle, nt, cells, "climatology");
        Ok(out)
    }

    /// The climatology repeated over the full length of the series.
    pub fn climatology_tiled(&self) -> Result<MaskedGridField, FieldError> {
        let clim = self.climatology()?;
        let nt = self.require_time_axis("climatology")?;
        let cycle = clim.shape()[0];
        let (cd, cm) = clim.flatten_spatial();
        let cells = self.n_cells();

        let data = Array2::from_shape_fn((nt, cells), |(t, c)| cd[[t % cycle, c]]);
        let mask = Array2::from_shape_fn((nt, cells), |(t, c)| cm[[t % cycle, c]]);
        let shape = self.shape_with_rows(nt);
        let mut out = self.replace_values(
            data.into_shape_with_order(IxDyn(&shape))?,
            mask.into_shape_with_order(IxDyn(&shape))?,
        );
        out.set_label(clim.label());
        Ok(out)
    }

    /// Computes the climatology and stores it as the full-record reference.
    pub fn cache_climatology(&mut self) -> Result<(), FieldError> {
        let clim = self.climatology()?;
        self.set_climatology_raw(Some(clim));
        Ok(())
    }

    /// Deviation of every sample from its climatological phase value.
    ///
    /// The result mask is the union of the original mask, invalid
    /// climatology phases and non-finite results.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::MissingClimatology`] for [`AnomalyBase::All`]
    /// without a cached climatology, [`FieldError::DimensionMismatch`] if the
    /// cached climatology does not line up, and the errors of
    /// [`Self::climatology`].
    pub fn deseasonalized_anomaly(&self, base: AnomalyBase) -> Result<MaskedGridField, FieldError> {
        let cycle = self.cycle()?;
        let nt = self.require_time_axis("deseasonalized_anomaly")?;
        let clim = match base {
            AnomalyBase::Current => self.climatology()?,
            AnomalyBase::All => self
                .climatology_raw()
                .cloned()
                .ok_or(FieldError::MissingClimatology)?,
        };
        let expected = self.shape_with_rows(cycle);
        if clim.shape() != expected.as_slice() {
            return Err(FieldError::DimensionMismatch {
                operation: "deseasonalized_anomaly",
                expected,
                got: clim.shape().to_vec(),
            });
        }

        let (data, mask) = self.flatten_spatial();
        let (cd, cm) = clim.flatten_spatial();
        let cells = self.n_cells();
        let anomaly = Array2::from_shape_fn((nt, cells), |(t, c)| data[[t, c]] - cd[[t % cycle, c]]);
        let invalid = Array2::from_shape_fn((nt, cells), |(t, c)| {
            mask[[t, c]] || cm[[t % cycle, c]] || !anomaly[[t, c]].is_finite()
        });

        let shape = self.shape_with_rows(nt);
        let mut out = self.replace_values(
            anomaly.into_shape_with_order(IxDyn(&shape))?,
            invalid.into_shape_with_order(IxDyn(&shape))?,
        );
        out.set_label(format!("{} anomaly", self.label()));
        Ok(out)
    }

    /// Boolean time mask selecting the given calendar months (1..=12).
    pub fn temporal_mask(&self, selected: &[u32]) -> Result<Vec<bool>, FieldError> {
        let m = months(self.require_time()?)?;
        Ok(m.iter().map(|month| selected.contains(month)).collect())
    }

    /// Mean of the valid samples of each calendar year.
    ///
    /// `mask`, when given, restricts the samples (e.g. to a season) and must
    /// have one entry per time step.
    pub fn yearmean(&self, mask: Option<&[bool]>) -> Result<YearlyAggregate, FieldError> {
        self.yearly(mask, mean)
    }

    /// Sum of the valid samples of each calendar year.
    pub fn yearsum(&self, mask: Option<&[bool]>) -> Result<YearlyAggregate, FieldError> {
        self.yearly(mask, |s| s.iter().sum())
    }

    fn yearly(
        &self,
        selection: Option<&[bool]>,
        reduce: impl Fn(&[f64]) -> f64,
    ) -> Result<YearlyAggregate, FieldError> {
        let nt = self.require_time_axis("yearly aggregation")?;
        let sample_years = years(self.require_time()?)?;
        if let Some(sel) = selection
            && sel.len() != nt
        {
            return Err(FieldError::DimensionMismatch {
                operation: "yearly aggregation",
                expected: vec![nt],
                got: vec![sel.len()],
            });
        }
        let unique: Vec<i32> = sample_years
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let (data, mask) = self.flatten_spatial();
        let cells = self.n_cells();
        let mut values = Vec::with_capacity(unique.len() * cells);
        let mut invalid = Vec::with_capacity(unique.len() * cells);
        for &year in &unique {
            let rows: Vec<usize> = (0..nt)
                .filter(|&t| sample_years[t] == year && selection.is_none_or(|s| s[t]))
                .collect();
            for cell in 0..cells {
                let samples = valid_samples(&data, &mask, rows.iter().copied(), cell);
                if samples.is_empty() {
                    values.push(f64::NAN);
                    invalid.push(true);
                } else {
                    values.push(reduce(&samples));
                    invalid.push(false);
                }
            }
        }

        let time = unique
            .iter()
            .map(|&y| timestamp_from_ymd(y, 1, 1))
            .collect::<Result<Vec<_>, _>>()?;
        let shape = self.shape_with_rows(unique.len());
        let mut field = self.temporal_field(
            ArrayD::from_shape_vec(IxDyn(&shape), values)?,
            ArrayD::from_shape_vec(IxDyn(&shape), invalid)?,
            Some(time),
        )?;
        field.set_time_cycle(None);
        Ok(YearlyAggregate {
            years: unique,
            field,
        })
    }

    /// Reduces every cell's valid samples along time; `None` from `reduce`
    /// marks the cell invalid.
    fn reduce_time(
        &self,
        reduce: impl Fn(&[f64]) -> Option<f64>,
    ) -> Result<MaskedGridField, FieldError> {
        let nt = self.require_time_axis("temporal reduction")?;
        let (data, mask) = self.flatten_spatial();
        let cells = self.n_cells();
        let (values, invalid): (Vec<f64>, Vec<bool>) = (0..cells)
            .map(|cell| match reduce(&valid_samples(&data, &mask, 0..nt, cell)) {
                Some(v) if v.is_finite() => (v, false),
                _ => (f64::NAN, true),
            })
            .unzip();

        let spatial = self.spatial_shape();
        let shape: Vec<usize> = if spatial.is_empty() { vec![1] } else { spatial.to_vec() };
        self.spatial_field(
            ArrayD::from_shape_vec(IxDyn(&shape), values)?,
            ArrayD::from_shape_vec(IxDyn(&shape), invalid)?,
        )
    }

    /// Temporal mean of valid samples. A field without time axis is copied.
    pub fn timmean(&self) -> Result<MaskedGridField, FieldError> {
        if !self.geometry().has_time_axis() {
            return Ok(self.clone());
        }
        self.reduce_time(|s| (!s.is_empty()).then(|| mean(s)))
    }

    /// Temporal sum of valid samples. A field without time axis is copied.
    pub fn timsum(&self) -> Result<MaskedGridField, FieldError> {
        if !self.geometry().has_time_axis() {
            return Ok(self.clone());
        }
        self.reduce_time(|s| (!s.is_empty()).then(|| s.iter().sum()))
    }

    /// Population variance (`ddof = 0`) along time.
    ///
    /// Returns `Ok(None)` for fields without a time axis.
    pub fn timvar(&self) -> Result<Option<MaskedGridField>, FieldError> {
        if !self.geometry().has_time_axis() {
            return Ok(None);
        }
        self.reduce_time(|s| (!s.is_empty()).then(|| population_variance(s)))
            .map(Some)
    }

    /// Population standard deviation (`ddof = 0`) along time.
    ///
    /// Returns `Ok(None)` for fields without a time axis.
    pub fn timstd(&self) -> Result<Option<MaskedGridField>, FieldError> {
        if !self.geometry().has_time_axis() {
            return Ok(None);
        }
        self.reduce_time(|s| (!s.is_empty()).then(|| population_variance(s).sqrt()))
            .map(Some)
    }

    /// Number of valid samples per cell.
    pub fn timn(&self) -> Result<MaskedGridField, FieldError> {
        if !self.geometry().has_time_axis() {
            let counts = self.mask().mapv(|m| if m { 0.0 } else { 1.0 });
            let valid = ArrayD::from_elem(counts.raw_dim(), false);
            return self.spatial_field(counts, valid);
        }
        self.reduce_time(|s| Some(s.len() as f64))
    }

    /// Type-7 percentile `p` in `[0, 1]` of the valid samples per cell.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidParameter`] for `p` outside `[0, 1]`.
    pub fn timpercentile(&self, p: f64) -> Result<MaskedGridField, FieldError> {
        if !(0.0..=1.0).contains(&p) {
            return Err(FieldError::InvalidParameter {
                name: "p",
                reason: format!("percentile {p} outside [0, 1]"),
            });
        }
        if !self.geometry().has_time_axis() {
            return Ok(self.clone());
        }
        let mut out = self.reduce_time(|s| quantile_type7(s, p))?;
        out.set_label(format!("{} - percentile: {:.2}", self.label(), p));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{arr1, arr2, arr3};

    fn monthly_series(values: &[f64], start_year: i32) -> MaskedGridField {
        let time: Vec<f64> = (0..values.len())
            .map(|i| {
                let y = start_year + (i / 12) as i32;
                let m = (i % 12) as u32 + 1;
                timestamp_from_ymd(y, m, 15).unwrap()
            })
            .collect();
        MaskedGridField::from_values(arr1(values).into_dyn())
            .unwrap()
            .with_time(time)
            .unwrap()
            .with_time_cycle(12)
    }

    #[test]
    fn climatology_requires_cycle() {
        let f = MaskedGridField::from_values(arr1(&[1.0, 2.0]).into_dyn())
            .unwrap()
            .with_time(vec![0.0, 1.0])
            .unwrap();
        assert!(matches!(
            f.climatology(),
            Err(FieldError::InvalidTimeSpec { .. })
        ));
    }

    #[test]
    fn climatology_requires_time_axis() {
        let f = MaskedGridField::from_values(arr2(&[[1.0, 2.0]]).into_dyn())
            .unwrap()
            .with_time_cycle(1);
        assert!(matches!(
            f.climatology(),
            Err(FieldError::UnsupportedGeometry { .. })
        ));
    }

    #[test]
    fn climatology_skips_invalid_samples() {
        let data = arr1(&[1.0, 10.0, 3.0, 20.0]).into_dyn();
        let mask = arr1(&[false, false, false, true]).into_dyn();
        let f = MaskedGridField::new(data, mask)
            .unwrap()
            .with_time(vec![0.0, 1.0, 2.0, 3.0])
            .unwrap()
            .with_time_cycle(2);
        let c = f.climatology().unwrap();
        assert_eq!(c.shape(), &[2]);
        assert_relative_eq!(c.data()[[0]], 2.0);
        assert_relative_eq!(c.data()[[1]], 10.0);
    }

    #[test]
    fn phase_without_samples_is_invalid() {
        let data = arr1(&[1.0, 5.0]).into_dyn();
        let mask = arr1(&[false, true]).into_dyn();
        let f = MaskedGridField::new(data, mask)
            .unwrap()
            .with_time(vec![0.0, 1.0])
            .unwrap()
            .with_time_cycle(2);
        let c = f.climatology().unwrap();
        assert!(c.mask()[[1]]);
        let a = f.deseasonalized_anomaly(AnomalyBase::Current).unwrap();
        assert!(a.mask()[[1]]);
    }

    #[test]
    fn anomaly_against_cached_climatology() {
        let f = monthly_series(&(0..24).map(f64::from).collect::<Vec<_>>(), 2000);
        let mut full = f.clone();
        full.cache_climatology().unwrap();
        let second_year = full.subset_time_indices(12, 24).unwrap();

        let vs_all = second_year.deseasonalized_anomaly(AnomalyBase::All).unwrap();
        let vs_current = second_year
            .deseasonalized_anomaly(AnomalyBase::Current)
            .unwrap();
        // Full-record January mean is 6; second-year January is 12.
        assert_relative_eq!(vs_all.data()[[0]], 6.0);
        assert_relative_eq!(vs_current.data()[[0]], 0.0);
        assert_eq!(vs_all.label(), " anomaly");
    }

    #[test]
    fn anomaly_all_without_cache_fails() {
        let f = monthly_series(&[1.0; 12], 2000);
        assert_eq!(
            f.deseasonalized_anomaly(AnomalyBase::All),
            Err(FieldError::MissingClimatology)
        );
    }

    #[test]
    fn yearmean_groups_by_calendar_year() {
        let f = monthly_series(&(0..24).map(f64::from).collect::<Vec<_>>(), 1999);
        let agg = f.yearmean(None).unwrap();
        assert_eq!(agg.years, vec![1999, 2000]);
        assert_relative_eq!(agg.field.data()[[0]], 5.5);
        assert_relative_eq!(agg.field.data()[[1]], 17.5);
        assert_eq!(
            agg.field.time().unwrap(),
            &[
                timestamp_from_ymd(1999, 1, 1).unwrap(),
                timestamp_from_ymd(2000, 1, 1).unwrap()
            ]
        );
    }

    #[test]
    fn yearsum_with_season_mask() {
        let f = monthly_series(&[1.0; 24], 2000);
        let jfm = f.temporal_mask(&[1, 2, 3]).unwrap();
        assert_eq!(jfm.iter().filter(|&&m| m).count(), 6);
        let agg = f.yearsum(Some(&jfm)).unwrap();
        assert_eq!(agg.field.data(), &arr1(&[3.0, 3.0]).into_dyn());
    }

    #[test]
    fn yearly_mask_length_is_checked() {
        let f = monthly_series(&[1.0; 12], 2000);
        assert!(matches!(
            f.yearmean(Some(&[true; 5])),
            Err(FieldError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn time_reductions_of_cube() {
        let data = arr3(&[[[1.0, 2.0]], [[3.0, 6.0]]]).into_dyn();
        let f = MaskedGridField::from_values(data)
            .unwrap()
            .with_time(vec![0.0, 1.0])
            .unwrap();
        assert_eq!(f.timmean().unwrap().data(), &arr2(&[[2.0, 4.0]]).into_dyn());
        assert_eq!(f.timsum().unwrap().data(), &arr2(&[[4.0, 8.0]]).into_dyn());
        assert_eq!(f.timvar().unwrap().unwrap().data(), &arr2(&[[1.0, 4.0]]).into_dyn());
        assert_eq!(f.timstd().unwrap().unwrap().data(), &arr2(&[[1.0, 2.0]]).into_dyn());
        assert_eq!(f.timn().unwrap().data(), &arr2(&[[2.0, 2.0]]).into_dyn());
        assert_eq!(
            f.timpercentile(0.5).unwrap().data(),
            &arr2(&[[2.0, 4.0]]).into_dyn()
        );
    }

    #[test]
    fn map_reductions_degenerate() {
        let map = MaskedGridField::from_values(arr2(&[[1.0, 2.0]]).into_dyn()).unwrap();
        assert_eq!(map.timmean().unwrap(), map);
        assert_eq!(map.timsum().unwrap(), map);
        assert!(map.timstd().unwrap().is_none());
        assert!(map.timvar().unwrap().is_none());
    }

    #[test]
    fn series_reduces_to_single_point() {
        let f = monthly_series(&[1.0, 2.0, 3.0], 2000);
        let m = f.timmean().unwrap();
        assert_eq!(m.shape(), &[1]);
        assert_relative_eq!(m.data()[[0]], 2.0);
    }

    #[test]
    fn percentile_of_all_invalid_cell_is_invalid() {
        let data = arr3(&[[[1.0, 9.0]], [[3.0, 9.0]], [[2.0, 9.0]]]).into_dyn();
        let mask = arr3(&[[[false, true]], [[false, true]], [[false, true]]]).into_dyn();
        let f = MaskedGridField::new(data, mask)
            .unwrap()
            .with_time(vec![0.0, 1.0, 2.0])
            .unwrap()
            .with_label("pr");

        let p90 = f.timpercentile(0.9).unwrap();
        assert_eq!(p90.shape(), &[1, 2]);
        assert_relative_eq!(p90.data()[[0, 0]], 2.8, epsilon = 1e-12);
        assert!(!p90.mask()[[0, 0]]);
        assert!(p90.mask()[[0, 1]]);
        assert_eq!(p90.label(), "pr - percentile: 0.90");
    }

    #[test]
    fn percentile_bounds() {
        let f = monthly_series(&[1.0, 2.0, 3.0], 2000);
        assert!(matches!(
            f.timpercentile(1.5),
            Err(FieldError::InvalidParameter { name: "p", .. })
        ));
    }
}
