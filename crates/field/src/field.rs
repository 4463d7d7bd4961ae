//! The masked grid field container.
//!
//! A [`MaskedGridField`] pairs a numeric buffer with a validity mask of the
//! same shape (`true` = invalid) and carries the coordinate, time and
//! descriptive metadata that travels with it through every operation.

use cmbs_time::replace_day_month;
use ndarray::{Array2, ArrayD, ArrayViewMutD, Axis, IxDyn, Slice, Zip};
use tracing::debug;

use crate::error::FieldError;
use crate::geometry::Geometry;

/// Longitude convention of a field's coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LonConvention {
    /// Longitudes in `[0, 360)`.
    #[default]
    ZeroTo360,
    /// Longitudes in `[-180, 180)`.
    PlusMinus180,
}

/// Maps a longitude into `[-180, 180)` by subtracting 360 from values >= 180.
pub(crate) fn to_plus_minus_180(lon: f64) -> f64 {
    if lon >= 180.0 { lon - 360.0 } else { lon }
}

/// A gridded, optionally time-varying field with a per-cell validity mask.
///
/// Cloning produces a fully independent copy, including the cached
/// climatology.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedGridField {
    data: ArrayD<f64>,
    /// `true` marks an invalid cell.
    mask: ArrayD<bool>,
    lat: Option<ArrayD<f64>>,
    lon: Option<ArrayD<f64>>,
    /// Days since 1970-01-01T00:00, non-decreasing.
    time: Option<Vec<f64>>,
    time_cycle: Option<usize>,
    unit: Option<String>,
    label: String,
    fill_value: Option<f64>,
    /// Climatology of the full, unsubset series.
    climatology_raw: Option<Box<MaskedGridField>>,
    lon_convention: LonConvention,
    detrended: bool,
}

impl MaskedGridField {
    /// Wraps a data buffer and its mask.
    ///
    /// Non-finite data values are marked invalid regardless of `mask`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::UnsupportedGeometry`] for ranks outside 1..=3
    /// and [`FieldError::DimensionMismatch`] if the shapes differ.
    pub fn new(data: ArrayD<f64>, mut mask: ArrayD<bool>) -> Result<Self, FieldError> {
        let ndim = data.ndim();
        if !(1..=3).contains(&ndim) {
            return Err(FieldError::UnsupportedGeometry {
                operation: "field construction",
                ndim,
            });
        }
        if data.shape() != mask.shape() {
            return Err(FieldError::DimensionMismatch {
                operation: "field construction",
                expected: data.shape().to_vec(),
                got: mask.shape().to_vec(),
            });
        }
        Zip::from(&mut mask)
            .and(&data)
            .for_each(|m, &v| *m |= !v.is_finite());

        Ok(Self {
            data,
            mask,
            lat: None,
            lon: None,
            time: None,
            time_cycle: None,
            unit: None,
            label: String::new(),
            fill_value: None,
            climatology_raw: None,
            lon_convention: LonConvention::default(),
            detrended: false,
        })
    }

    /// Wraps a data buffer with every finite cell valid.
    pub fn from_values(data: ArrayD<f64>) -> Result<Self, FieldError> {
        let mask = ArrayD::from_elem(data.raw_dim(), false);
        Self::new(data, mask)
    }

    // -- Builders -----------------------------------------------------------

    /// Attaches timestamps to axis 0.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidTimeSpec`] if the timestamps are not
    /// finite and non-decreasing, and [`FieldError::DimensionMismatch`] if
    /// their count differs from `shape[0]`.
    pub fn with_time(mut self, time: Vec<f64>) -> Result<Self, FieldError> {
        validate_time(&time)?;
        let nt = self.data.shape()[0];
        if time.len() != nt {
            return Err(FieldError::DimensionMismatch {
                operation: "time axis",
                expected: vec![nt],
                got: vec![time.len()],
            });
        }
        self.time = Some(time);
        Ok(self)
    }

    /// Attaches latitude and longitude, as 1-D vectors or 2-D meshes.
    ///
    /// Shapes are not checked here; see [`Self::try_mesh_coordinates`].
    pub fn with_coordinates(mut self, lat: ArrayD<f64>, lon: ArrayD<f64>) -> Self {
        self.lat = Some(lat);
        self.lon = Some(lon);
        self
    }

    /// Sets the number of samples per periodic cycle.
    pub fn with_time_cycle(mut self, cycle: usize) -> Self {
        self.time_cycle = Some(cycle);
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Records the fill value the mask was derived from.
    pub fn with_fill_value(mut self, fill_value: f64) -> Self {
        self.fill_value = Some(fill_value);
        self
    }

    pub fn with_lon_convention(mut self, convention: LonConvention) -> Self {
        self.lon_convention = convention;
        self
    }

    /// Stores a precomputed climatology as the full-record reference.
    pub fn with_climatology_raw(mut self, climatology: MaskedGridField) -> Self {
        self.climatology_raw = Some(Box::new(climatology));
        self
    }

    // -- Accessors ----------------------------------------------------------

    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    /// Validity mask, `true` where invalid.
    pub fn mask(&self) -> &ArrayD<bool> {
        &self.mask
    }

    /// Mutable view of the values. The shape cannot change through it.
    pub fn data_mut(&mut self) -> ArrayViewMutD<'_, f64> {
        self.data.view_mut()
    }

    /// Mutable view of the mask. The shape cannot change through it.
    pub fn mask_mut(&mut self) -> ArrayViewMutD<'_, bool> {
        self.mask.view_mut()
    }

    pub fn lat(&self) -> Option<&ArrayD<f64>> {
        self.lat.as_ref()
    }

    pub fn lon(&self) -> Option<&ArrayD<f64>> {
        self.lon.as_ref()
    }

    pub fn time(&self) -> Option<&[f64]> {
        self.time.as_deref()
    }

    pub fn time_cycle(&self) -> Option<usize> {
        self.time_cycle
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn fill_value(&self) -> Option<f64> {
        self.fill_value
    }

    pub fn climatology_raw(&self) -> Option<&MaskedGridField> {
        self.climatology_raw.as_deref()
    }

    pub fn lon_convention(&self) -> LonConvention {
        self.lon_convention
    }

    pub fn is_detrended(&self) -> bool {
        self.detrended
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn set_detrended(&mut self, detrended: bool) {
        self.detrended = detrended;
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    pub fn geometry(&self) -> Geometry {
        // Rank is kept within 1..=3 by construction.
        Geometry::classify(self.data.ndim(), self.time.is_some()).unwrap_or(Geometry::Points)
    }

    /// Shape without the time axis.
    pub fn spatial_shape(&self) -> &[usize] {
        if self.geometry().has_time_axis() {
            &self.data.shape()[1..]
        } else {
            self.data.shape()
        }
    }

    /// Number of time steps, if axis 0 is time.
    pub fn nt(&self) -> Option<usize> {
        self.geometry()
            .has_time_axis()
            .then(|| self.data.shape()[0])
    }

    /// Number of spatial cells (1 for a bare series).
    pub fn n_cells(&self) -> usize {
        self.spatial_shape().iter().product()
    }

    /// Number of valid cells over the whole buffer.
    pub fn n_valid(&self) -> usize {
        self.mask.iter().filter(|&&m| !m).count()
    }

    /// Values with invalid cells replaced by `fill`.
    pub fn filled(&self, fill: f64) -> ArrayD<f64> {
        Zip::from(&self.data)
            .and(&self.mask)
            .map_collect(|&v, &m| if m { fill } else { v })
    }

    /// Data and mask reshaped to `(time, cell)`; a field without a time axis
    /// becomes a single row.
    pub fn flatten_spatial(&self) -> (Array2<f64>, Array2<bool>) {
        let rows = self.nt().unwrap_or(1);
        let cols = self.n_cells();
        let values: Vec<f64> = self.data.iter().copied().collect();
        let flags: Vec<bool> = self.mask.iter().copied().collect();
        let data = Array2::from_shape_fn((rows, cols), |(t, c)| values[t * cols + c]);
        let mask = Array2::from_shape_fn((rows, cols), |(t, c)| flags[t * cols + c]);
        (data, mask)
    }

    /// Shape of a buffer with `rows` time steps and this field's spatial shape.
    pub(crate) fn shape_with_rows(&self, rows: usize) -> Vec<usize> {
        std::iter::once(rows)
            .chain(self.spatial_shape().iter().copied())
            .collect()
    }

    /// A copy carrying new values and mask of the same shape.
    pub(crate) fn replace_values(&self, data: ArrayD<f64>, mask: ArrayD<bool>) -> Self {
        let mut out = self.clone();
        out.data = data;
        out.mask = mask;
        out
    }

    /// Builds a field without time axis that inherits this field's spatial
    /// coordinates and descriptive metadata.
    pub fn spatial_field(&self, data: ArrayD<f64>, mask: ArrayD<bool>) -> Result<Self, FieldError> {
        let mut out = Self::new(data, mask)?;
        out.lat = self.lat.clone();
        out.lon = self.lon.clone();
        out.unit = self.unit.clone();
        out.label = self.label.clone();
        out.lon_convention = self.lon_convention;
        out.detrended = self.detrended;
        Ok(out)
    }

    /// Builds a field with `rows` leading time steps carrying `time`, this
    /// field's spatial coordinates and descriptive metadata, and no cached
    /// climatology.
    pub(crate) fn temporal_field(
        &self,
        data: ArrayD<f64>,
        mask: ArrayD<bool>,
        time: Option<Vec<f64>>,
    ) -> Result<Self, FieldError> {
        let mut out = self.spatial_field(data, mask)?;
        if let Some(time) = time {
            out = out.with_time(time)?;
        }
        out.time_cycle = self.time_cycle;
        out.fill_value = self.fill_value;
        Ok(out)
    }

    pub(crate) fn require_time(&self) -> Result<&[f64], FieldError> {
        self.time.as_deref().ok_or_else(|| FieldError::InvalidTimeSpec {
            reason: "field has no time axis".into(),
        })
    }

    pub(crate) fn set_time_unchecked(&mut self, time: Option<Vec<f64>>) {
        self.time = time;
    }

    pub(crate) fn set_time_cycle(&mut self, cycle: Option<usize>) {
        self.time_cycle = cycle;
    }

    pub(crate) fn set_arrays(&mut self, data: ArrayD<f64>, mask: ArrayD<bool>) {
        self.data = data;
        self.mask = mask;
    }

    pub(crate) fn set_coordinates(&mut self, lat: Option<ArrayD<f64>>, lon: Option<ArrayD<f64>>) {
        self.lat = lat;
        self.lon = lon;
    }

    pub(crate) fn climatology_raw_mut(&mut self) -> Option<&mut MaskedGridField> {
        self.climatology_raw.as_deref_mut()
    }

    pub(crate) fn set_climatology_raw(&mut self, climatology: Option<MaskedGridField>) {
        self.climatology_raw = climatology.map(Box::new);
    }

    // -- Shape-changing operations -----------------------------------------

    /// Circularly shifts the last axis by `n` positions (negative allowed).
    ///
    /// Applies to data, mask, 2-D coordinate meshes, the longitude vector
    /// (or both vectors for point geometries) and the cached climatology.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::UnsupportedGeometry`] for a bare time series.
    pub fn shift_x(&mut self, n: isize) -> Result<(), FieldError> {
        let geometry = self.geometry();
        if geometry == Geometry::Series {
            return Err(FieldError::UnsupportedGeometry {
                operation: "shift_x",
                ndim: self.ndim(),
            });
        }
        let last = Axis(self.data.ndim() - 1);
        self.data = roll(&self.data, last, n);
        self.mask = roll(&self.mask, last, n);

        let roll_coord = |c: &mut ArrayD<f64>, is_lat: bool| {
            let vector_follows_x = !is_lat || !geometry.has_grid();
            if c.ndim() == 2 || vector_follows_x {
                *c = roll(c, Axis(c.ndim() - 1), n);
            }
        };
        if let Some(lat) = self.lat.as_mut() {
            roll_coord(lat, true);
        }
        if let Some(lon) = self.lon.as_mut() {
            roll_coord(lon, false);
        }
        if let Some(clim) = self.climatology_raw.as_deref_mut() {
            clim.shift_x(n)?;
        }
        Ok(())
    }

    /// Rotates the time axis by `n` steps toward earlier times.
    ///
    /// For yearly samples `[1980, 1981, 1982]`, `n = 1` yields
    /// `[1981, 1982, 1980]`. Only data and mask move; timestamps stay.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::UnsupportedGeometry`] if axis 0 is not time.
    pub fn timeshift(&mut self, n: isize) -> Result<(), FieldError> {
        if !self.geometry().has_time_axis() {
            return Err(FieldError::UnsupportedGeometry {
                operation: "timeshift",
                ndim: self.ndim(),
            });
        }
        if n == 0 {
            return Ok(());
        }
        self.data = roll(&self.data, Axis(0), -n);
        self.mask = roll(&self.mask, Axis(0), -n);
        Ok(())
    }

    /// Converts longitudes from `[0, 360)` to `[-180, 180)`.
    pub fn normalize_longitude(&mut self) {
        if let Some(lon) = self.lon.as_mut() {
            lon.mapv_inplace(to_plus_minus_180);
        }
        self.lon_convention = LonConvention::PlusMinus180;
        if let Some(clim) = self.climatology_raw.as_deref_mut() {
            clim.normalize_longitude();
        }
    }

    /// Whether lat and lon are present and both match the spatial shape.
    pub fn has_matching_coordinates(&self) -> bool {
        let spatial = self.spatial_shape();
        match (&self.lat, &self.lon) {
            (Some(lat), Some(lon)) => lat.shape() == spatial && lon.shape() == spatial,
            _ => false,
        }
    }

    /// Latitude and longitude expanded to the spatial shape.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidParameter`] when the field has no
    /// coordinates, and [`FieldError::DimensionMismatch`] when they cannot be
    /// matched to the spatial shape.
    pub fn coordinate_grids(&self) -> Result<(ArrayD<f64>, ArrayD<f64>), FieldError> {
        let (Some(lat), Some(lon)) = (&self.lat, &self.lon) else {
            return Err(FieldError::InvalidParameter {
                name: "coordinates",
                reason: "field has no lat/lon coordinates".into(),
            });
        };
        let spatial = self.spatial_shape();
        if lat.shape() == spatial && lon.shape() == spatial {
            return Ok((lat.clone(), lon.clone()));
        }
        if self.geometry().has_grid() && lat.ndim() == 1 && lon.ndim() == 1 {
            let (ny, nx) = (spatial[0], spatial[1]);
            if lat.len() == ny && lon.len() == nx {
                let lat_grid = ArrayD::from_shape_fn(IxDyn(&[ny, nx]), |ix| lat[[ix[0]]]);
                let lon_grid = ArrayD::from_shape_fn(IxDyn(&[ny, nx]), |ix| lon[[ix[1]]]);
                return Ok((lat_grid, lon_grid));
            }
        }
        Err(FieldError::DimensionMismatch {
            operation: "coordinate mesh",
            expected: spatial.to_vec(),
            got: vec![lat.len(), lon.len()],
        })
    }

    /// Expands 1-D lat/lon vectors into 2-D meshes matching the grid.
    ///
    /// A field without coordinates is left untouched.
    pub fn try_mesh_coordinates(&mut self) -> Result<(), FieldError> {
        if self.lat.is_none() && self.lon.is_none() {
            return Ok(());
        }
        let (lat, lon) = self.coordinate_grids()?;
        debug!(shape = ?lat.shape(), "meshed coordinates");
        self.lat = Some(lat);
        self.lon = Some(lon);
        Ok(())
    }

    /// Drops singleton axes of rank-3 data.
    ///
    /// Dropping the time axis also drops the timestamps. The cached
    /// climatology no longer lines up afterwards and is discarded.
    pub fn squeeze(&mut self) {
        if self.data.ndim() <= 2 {
            return;
        }
        let before = self.data.shape().to_vec();
        for axis in (0..before.len()).rev() {
            if before[axis] == 1 && self.data.ndim() > 1 {
                self.data = self.data.clone().index_axis_move(Axis(axis), 0);
                self.mask = self.mask.clone().index_axis_move(Axis(axis), 0);
                if axis == 0 {
                    self.time = None;
                }
            }
        }
        if self.data.shape() != before.as_slice() {
            debug!(?before, after = ?self.data.shape(), "squeezed field");
            self.climatology_raw = None;
        }
    }

    /// Keeps every `step`-th row and column of a grid.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidParameter`] for `step == 0` and
    /// [`FieldError::UnsupportedGeometry`] for fields without a `(y, x)` grid.
    pub fn sub_sample(&mut self, step: usize) -> Result<(), FieldError> {
        if step == 0 {
            return Err(FieldError::InvalidParameter {
                name: "step",
                reason: "must be at least 1".into(),
            });
        }
        let geometry = self.geometry();
        if !geometry.has_grid() {
            return Err(FieldError::UnsupportedGeometry {
                operation: "sub_sample",
                ndim: self.ndim(),
            });
        }
        let first = usize::from(geometry == Geometry::Cube);
        self.data = stride_grid(&self.data, first, step);
        self.mask = stride_grid(&self.mask, first, step);
        for coord in [self.lat.as_mut(), self.lon.as_mut()].into_iter().flatten() {
            *coord = match coord.ndim() {
                2 => stride_grid(coord, 0, step),
                _ => coord
                    .slice_axis(Axis(0), Slice::new(0, None, step as isize))
                    .to_owned(),
            };
        }
        if let Some(clim) = self.climatology_raw.as_deref_mut() {
            clim.sub_sample(step)?;
        }
        Ok(())
    }

    /// Sets the same day and/or month on every timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidTimeSpec`] when the field has no time
    /// axis, when a replacement date does not exist, or when the result is
    /// no longer ordered.
    pub fn adjust_time(&mut self, day: Option<u32>, month: Option<u32>) -> Result<(), FieldError> {
        let adjusted = self
            .require_time()?
            .iter()
            .map(|&t| replace_day_month(t, day, month))
            .collect::<Result<Vec<_>, _>>()?;
        validate_time(&adjusted)?;
        self.time = Some(adjusted);
        Ok(())
    }
}

/// Checks that timestamps are finite and non-decreasing.
pub(crate) fn validate_time(time: &[f64]) -> Result<(), FieldError> {
    if let Some(i) = time.iter().position(|t| !t.is_finite()) {
        return Err(FieldError::InvalidTimeSpec {
            reason: format!("non-finite timestamp at index {i}"),
        });
    }
    if let Some(i) = time.windows(2).position(|w| w[1] < w[0]) {
        return Err(FieldError::InvalidTimeSpec {
            reason: format!("time decreases at index {}", i + 1),
        });
    }
    Ok(())
}

/// `np.roll` along one axis.
pub(crate) fn roll<T: Clone>(a: &ArrayD<T>, axis: Axis, n: isize) -> ArrayD<T> {
    let len = a.len_of(axis);
    if len == 0 {
        return a.clone();
    }
    let shift = n.rem_euclid(len as isize) as usize;
    let indices: Vec<usize> = (0..len).map(|i| (i + len - shift) % len).collect();
    a.select(axis, &indices)
}

fn stride_grid<T: Clone>(a: &ArrayD<T>, first: usize, step: usize) -> ArrayD<T> {
    let s = Slice::new(0, None, step as isize);
    a.slice_axis(Axis(first), s)
        .slice_axis(Axis(first + 1), s)
        .to_owned()
}
