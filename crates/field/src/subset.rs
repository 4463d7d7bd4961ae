//! Temporal subsetting.

use ndarray::{Axis, Slice};
use tracing::debug;

use crate::error::FieldError;
use crate::field::{MaskedGridField, validate_time};

impl MaskedGridField {
    /// Index range `[i1, i2)` covering the timestamps within `[start, stop]`.
    ///
    /// Each bound is located by nearest-timestamp search and nudged inward by
    /// one sample if the nearest timestamp lies outside the interval. A
    /// missing bound means no subsetting.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidTimeSpec`] if the field has no (ordered)
    /// time axis, and [`FieldError::InvalidTimeRange`] if `stop < start` or
    /// the window selects no sample.
    pub fn time_indices(
        &self,
        start: Option<f64>,
        stop: Option<f64>,
    ) -> Result<(usize, usize), FieldError> {
        let time = self.require_time()?;
        let (Some(start), Some(stop)) = (start, stop) else {
            return Ok((0, time.len()));
        };
        if stop < start {
            return Err(FieldError::InvalidTimeRange {
                reason: format!("stop {stop} is before start {start}"),
            });
        }
        validate_time(time)?;

        let nearest = |target: f64| {
            time.iter()
                .enumerate()
                .fold((0usize, f64::INFINITY), |best, (i, &t)| {
                    let d = (t - target).abs();
                    if d < best.1 { (i, d) } else { best }
                })
                .0
        };

        let mut m1 = nearest(start);
        let mut m2 = nearest(stop) as isize;
        if time.get(m1).is_some_and(|&t| t < start) {
            m1 += 1;
        }
        if time.get(m2 as usize).is_some_and(|&t| t > stop) {
            m2 -= 1;
        }
        let m2 = (m2 + 1).max(0) as usize;

        if m2 <= m1 {
            return Err(FieldError::InvalidTimeRange {
                reason: format!("no timestamps between {start} and {stop}"),
            });
        }
        Ok((m1, m2))
    }

    /// Copy restricted to the samples in `[start, stop]`.
    ///
    /// The cached climatology is kept as is.
    pub fn subset_time(
        &self,
        start: Option<f64>,
        stop: Option<f64>,
    ) -> Result<MaskedGridField, FieldError> {
        let mut out = self.clone();
        out.subset_time_in_place(start, stop)?;
        Ok(out)
    }

    pub fn subset_time_in_place(
        &mut self,
        start: Option<f64>,
        stop: Option<f64>,
    ) -> Result<(), FieldError> {
        if start.is_none() || stop.is_none() {
            return Ok(());
        }
        let (i1, i2) = self.time_indices(start, stop)?;
        self.slice_time(i1, i2)
    }

    /// Copy restricted to time indices `[i1, i2)`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::UnsupportedGeometry`] if axis 0 is not time and
    /// [`FieldError::InvalidTimeRange`] for inverted or out-of-range indices.
    pub fn subset_time_indices(&self, i1: usize, i2: usize) -> Result<MaskedGridField, FieldError> {
        let mut out = self.clone();
        out.slice_time(i1, i2)?;
        Ok(out)
    }

    fn slice_time(&mut self, i1: usize, i2: usize) -> Result<(), FieldError> {
        let Some(nt) = self.nt() else {
            return Err(FieldError::UnsupportedGeometry {
                operation: "temporal subsetting",
                ndim: self.ndim(),
            });
        };
        if i2 < i1 || i2 > nt {
            return Err(FieldError::InvalidTimeRange {
                reason: format!("indices {i1}..{i2} outside 0..{nt}"),
            });
        }
        let s = Slice::from(i1..i2);
        let data = self.data().slice_axis(Axis(0), s).to_owned();
        let mask = self.mask().slice_axis(Axis(0), s).to_owned();
        let time = self.time().map(|t| t[i1..i2].to_vec());
        self.set_arrays(data, mask);
        self.set_time_unchecked(time);
        debug!(i1, i2, nt, "temporal subset");
        Ok(())
    }
}
