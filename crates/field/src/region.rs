//! Rectangular regions of interest.
//!
//! A [`Region`] is either an index window into the `(y, x)` grid or a
//! latitude/longitude bounding box. Index windows slice a field; bounding
//! boxes mask everything outside them.

use ndarray::{ArrayD, Axis, Slice, Zip};
use tracing::debug;

use crate::error::FieldError;
use crate::field::{LonConvention, MaskedGridField, to_plus_minus_180};

/// Bounds of a [`Region`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegionBounds {
    /// Half-open index window `[x1, x2) x [y1, y2)`.
    Index {
        x1: usize,
        x2: usize,
        y1: usize,
        y2: usize,
    },
    /// Inclusive bounding box, longitudes in `[-180, 180)`.
    LatLon {
        lonmin: f64,
        lonmax: f64,
        latmin: f64,
        latmax: f64,
    },
}

/// A labelled region with an optional auxiliary validity mask.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    id: u32,
    label: String,
    bounds: RegionBounds,
    /// `true` where the region is valid; grid shaped.
    mask: Option<ArrayD<bool>>,
}

impl Region {
    /// Region given by grid indices.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidRegion`] if `x2 < x1` or `y2 < y1`.
    pub fn index(
        id: u32,
        label: impl Into<String>,
        x1: usize,
        x2: usize,
        y1: usize,
        y2: usize,
    ) -> Result<Self, FieldError> {
        let label = label.into();
        check_bounds(&label, x1 as f64, x2 as f64, y1 as f64, y2 as f64)?;
        Ok(Self {
            id,
            label,
            bounds: RegionBounds::Index { x1, x2, y1, y2 },
            mask: None,
        })
    }

    /// Region given by a longitude/latitude box.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidRegion`] if a bound is NaN,
    /// `lonmax < lonmin` or `latmax < latmin`.
    pub fn lat_lon(
        id: u32,
        label: impl Into<String>,
        lonmin: f64,
        lonmax: f64,
        latmin: f64,
        latmax: f64,
    ) -> Result<Self, FieldError> {
        let label = label.into();
        check_bounds(&label, lonmin, lonmax, latmin, latmax)?;
        Ok(Self {
            id,
            label,
            bounds: RegionBounds::LatLon {
                lonmin,
                lonmax,
                latmin,
                latmax,
            },
            mask: None,
        })
    }

    /// Adds an auxiliary mask (`true` = inside) intersected with the box.
    pub fn with_mask(mut self, mask: ArrayD<bool>) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn bounds(&self) -> RegionBounds {
        self.bounds
    }

    pub fn mask(&self) -> Option<&ArrayD<bool>> {
        self.mask.as_ref()
    }

    /// Bounding box corners as `(x, y)`:
    /// `(x1, y1), (x1, y2), (x2, y2), (x2, y1)`.
    pub fn corners(&self) -> [(f64, f64); 4] {
        let (x1, x2, y1, y2) = match self.bounds {
            RegionBounds::Index { x1, x2, y1, y2 } => (x1 as f64, x2 as f64, y1 as f64, y2 as f64),
            RegionBounds::LatLon {
                lonmin,
                lonmax,
                latmin,
                latmax,
            } => (lonmin, lonmax, latmin, latmax),
        };
        [(x1, y1), (x1, y2), (x2, y2), (x2, y1)]
    }

    /// Slices `[:, y1:y2, x1:x2]` of a rank-3 array or `[y1:y2, x1:x2]` of a
    /// rank-2 array. Bounds beyond the array are clipped.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidRegion`] for a lat/lon region and
    /// [`FieldError::UnsupportedGeometry`] for other ranks.
    pub fn get_subset<T: Clone>(&self, array: &ArrayD<T>) -> Result<ArrayD<T>, FieldError> {
        let RegionBounds::Index { x1, x2, y1, y2 } = self.bounds else {
            return Err(FieldError::InvalidRegion {
                label: self.label.clone(),
                reason: "lat/lon regions cannot slice arrays".into(),
            });
        };
        let first = match array.ndim() {
            3 => 1,
            2 => 0,
            ndim => {
                return Err(FieldError::UnsupportedGeometry {
                    operation: "region subset",
                    ndim,
                });
            }
        };
        let ys = clipped(y1, y2, array.len_of(Axis(first)));
        let xs = clipped(x1, x2, array.len_of(Axis(first + 1)));
        Ok(array
            .slice_axis(Axis(first), ys)
            .slice_axis(Axis(first + 1), xs)
            .to_owned())
    }
}

fn check_bounds(label: &str, x1: f64, x2: f64, y1: f64, y2: f64) -> Result<(), FieldError> {
    let invalid = |reason: &str| FieldError::InvalidRegion {
        label: label.to_string(),
        reason: reason.to_string(),
    };
    if [x1, x2, y1, y2].iter().any(|v| v.is_nan()) {
        return Err(invalid("bounds must not be NaN"));
    }
    if x2 < x1 {
        return Err(invalid("invalid x boundaries"));
    }
    if y2 < y1 {
        return Err(invalid("invalid y boundaries"));
    }
    Ok(())
}

fn clipped(start: usize, stop: usize, len: usize) -> Slice {
    let stop = stop.min(len);
    Slice::from(start.min(stop)..stop)
}

impl MaskedGridField {
    /// Restricts the field to a region.
    ///
    /// An index window slices data, mask, coordinates and the cached
    /// climatology and appends `" (<region label>)"` to the label. A lat/lon
    /// box keeps the shape and masks everything outside it
    /// (see [`Self::apply_region_mask`]).
    pub fn region_subset(&self, region: &Region) -> Result<MaskedGridField, FieldError> {
        match region.bounds() {
            RegionBounds::Index { x1, x2, y1, y2 } => {
                if !self.geometry().has_grid() {
                    return Err(FieldError::UnsupportedGeometry {
                        operation: "region subset",
                        ndim: self.ndim(),
                    });
                }
                let data = region.get_subset(self.data())?;
                let mask = region.get_subset(self.mask())?;
                let mut out = self.replace_values(data, mask);

                let slice_coord = |c: &ArrayD<f64>, vector_range: (usize, usize)| match c.ndim() {
                    2 => region.get_subset(c),
                    _ => Ok(c
                        .slice_axis(Axis(0), clipped(vector_range.0, vector_range.1, c.len()))
                        .to_owned()),
                };
                let lat = self.lat().map(|c| slice_coord(c, (y1, y2))).transpose()?;
                let lon = self.lon().map(|c| slice_coord(c, (x1, x2))).transpose()?;
                out.set_coordinates(lat, lon);

                let clim = match self.climatology_raw() {
                    Some(c) => Some(c.region_subset(region)?),
                    None => None,
                };
                out.set_climatology_raw(clim);
                out.set_label(format!("{} ({})", self.label(), region.label()));
                debug!(region = region.label(), shape = ?out.shape(), "index region subset");
                Ok(out)
            }
            RegionBounds::LatLon { .. } => {
                let mut out = self.clone();
                out.apply_region_mask(region)?;
                Ok(out)
            }
        }
    }

    /// Invalidates every cell outside a lat/lon region.
    ///
    /// Longitudes of a field in the 0..360 convention are compared in
    /// -180..180. Bounds are inclusive. The region's auxiliary mask, when
    /// present, is intersected with the box.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidRegion`] for an index region,
    /// [`FieldError::DimensionMismatch`] if the auxiliary mask does not match
    /// the grid, and the errors of [`Self::coordinate_grids`].
    pub fn apply_region_mask(&mut self, region: &Region) -> Result<(), FieldError> {
        let RegionBounds::LatLon {
            lonmin,
            lonmax,
            latmin,
            latmax,
        } = region.bounds()
        else {
            return Err(FieldError::InvalidRegion {
                label: region.label().to_string(),
                reason: "index regions cannot mask by coordinates".into(),
            });
        };

        let (lat, mut lon) = self.coordinate_grids()?;
        if self.lon_convention() == LonConvention::ZeroTo360 {
            lon.mapv_inplace(to_plus_minus_180);
        }

        let mut valid = Zip::from(&lat)
            .and(&lon)
            .map_collect(|&la, &lo| la >= latmin && la <= latmax && lo >= lonmin && lo <= lonmax);

        if let Some(aux) = region.mask() {
            if aux.shape() != valid.shape() {
                return Err(FieldError::DimensionMismatch {
                    operation: "region mask",
                    expected: valid.shape().to_vec(),
                    got: aux.shape().to_vec(),
                });
            }
            Zip::from(&mut valid).and(aux).for_each(|v, &a| *v &= a);
        }

        debug!(
            region = region.label(),
            inside = valid.iter().filter(|&&v| v).count(),
            "lat/lon region mask"
        );
        self.apply_mask(&valid, true)
    }
}
