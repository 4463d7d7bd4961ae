//! Validity-mask management.

use ndarray::{ArrayD, ArrayViewD, Axis, Zip};
use tracing::debug;

use crate::error::FieldError;
use crate::field::MaskedGridField;

impl MaskedGridField {
    /// Invalidates every cell where `valid` is `false`.
    ///
    /// `valid` has either the spatial shape (applied to every time step) or
    /// the full data shape. With `keep_previous` the new mask is the union
    /// with the current one; otherwise the mask is reset to exactly
    /// `!valid`, except that cells holding non-finite values stay invalid.
    /// A spatial mask is also unioned into the cached climatology.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::DimensionMismatch`] if `valid` matches neither
    /// shape.
    pub fn apply_mask(&mut self, valid: &ArrayD<bool>, keep_previous: bool) -> Result<(), FieldError> {
        let expanded = self.expand_mask(valid)?;

        let mut mask = self.mask().clone();
        Zip::from(&mut mask)
            .and(&expanded)
            .and(self.data())
            .for_each(|m, &ok, &v| {
                let prior = keep_previous && *m;
                *m = prior || !ok || !v.is_finite();
            });
        self.mask_mut().assign(&mask);

        if let Some(clim) = self.climatology_raw_mut() {
            if clim.spatial_shape() == valid.shape() || clim.shape() == valid.shape() {
                clim.apply_mask(valid, true)?;
            } else {
                debug!(shape = ?valid.shape(), "mask not applicable to cached climatology");
            }
        }
        Ok(())
    }

    fn expand_mask<'a>(&self, valid: &'a ArrayD<bool>) -> Result<ArrayViewD<'a, bool>, FieldError> {
        if valid.shape() == self.shape() {
            return Ok(valid.view());
        }
        if valid.shape() == self.spatial_shape() {
            if let Some(view) = valid.broadcast(self.data().raw_dim()) {
                return Ok(view);
            }
        }
        Err(FieldError::DimensionMismatch {
            operation: "apply_mask",
            expected: self.spatial_shape().to_vec(),
            got: valid.shape().to_vec(),
        })
    }

    /// Cells valid in every time step (`require_all`) or in at least one.
    ///
    /// Has the spatial shape. For a field without a time axis it is the
    /// negated mask.
    pub fn valid_mask(&self, require_all: bool) -> ArrayD<bool> {
        if !self.geometry().has_time_axis() {
            return self.mask().mapv(|m| !m);
        }
        self.mask().map_axis(Axis(0), |lane| {
            if require_all {
                lane.iter().all(|&m| !m)
            } else {
                lane.iter().any(|&m| !m)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr2, arr3};

    fn cube() -> MaskedGridField {
        let data = arr3(&[[[1.0, 2.0], [3.0, 4.0]], [[5.0, 6.0], [7.0, 8.0]]]).into_dyn();
        let mask = arr3(&[[[false, false], [false, false]], [[false, true], [false, false]]]).into_dyn();
        MaskedGridField::new(data, mask)
            .unwrap()
            .with_time(vec![0.0, 1.0])
            .unwrap()
    }

    #[test]
    fn spatial_mask_applies_to_every_step() {
        let mut f = cube();
        f.apply_mask(&arr2(&[[true, true], [false, true]]).into_dyn(), true)
            .unwrap();
        assert!(f.mask()[[0, 1, 0]]);
        assert!(f.mask()[[1, 1, 0]]);
        // Previous invalid cell is kept.
        assert!(f.mask()[[1, 0, 1]]);
        assert!(!f.mask()[[0, 0, 1]]);
    }

    #[test]
    fn reset_replaces_previous_mask() {
        let mut f = cube();
        f.apply_mask(&arr2(&[[true, true], [false, true]]).into_dyn(), false)
            .unwrap();
        assert!(!f.mask()[[1, 0, 1]]);
        assert!(f.mask()[[1, 1, 0]]);
    }

    #[test]
    fn union_is_monotonic() {
        let m1 = arr2(&[[true, false], [true, true]]).into_dyn();
        let m2 = arr2(&[[true, true], [false, true]]).into_dyn();
        let mut f = cube();
        let before = f.mask().clone();
        f.apply_mask(&m1, true).unwrap();
        f.apply_mask(&m2, true).unwrap();
        for ((t, y, x), &m) in f.mask().clone().into_dimensionality::<ndarray::Ix3>().unwrap().indexed_iter() {
            let expected = before[[t, y, x]] || !m1[[y, x]] || !m2[[y, x]];
            assert_eq!(m, expected);
        }
    }

    #[test]
    fn full_shape_mask() {
        let mut f = cube();
        let mut valid = ArrayD::from_elem(f.shape().to_vec(), true);
        valid[[0, 0, 0]] = false;
        f.apply_mask(&valid, true).unwrap();
        assert!(f.mask()[[0, 0, 0]]);
        assert!(!f.mask()[[1, 0, 0]]);
    }

    #[test]
    fn wrong_shape_fails() {
        let mut f = cube();
        let valid = ArrayD::from_elem(vec![3, 3], true);
        assert!(matches!(
            f.apply_mask(&valid, true),
            Err(FieldError::DimensionMismatch { operation: "apply_mask", .. })
        ));
    }

    #[test]
    fn climatology_receives_spatial_mask() {
        let clim = cube();
        let mut f = cube().with_climatology_raw(clim);
        f.apply_mask(&arr2(&[[false, true], [true, true]]).into_dyn(), true)
            .unwrap();
        let c = f.climatology_raw().unwrap();
        assert!(c.mask()[[0, 0, 0]]);
        assert!(c.mask()[[1, 0, 0]]);
    }

    #[test]
    fn valid_mask_all_and_one() {
        let f = cube();
        assert_eq!(f.valid_mask(true), arr2(&[[true, false], [true, true]]).into_dyn());
        assert_eq!(f.valid_mask(false), arr2(&[[true, true], [true, true]]).into_dyn());
    }

    #[test]
    fn valid_mask_of_map_is_negated_mask() {
        let f = MaskedGridField::new(
            arr2(&[[1.0, 2.0]]).into_dyn(),
            arr2(&[[true, false]]).into_dyn(),
        )
        .unwrap();
        assert_eq!(f.valid_mask(true), arr2(&[[false, true]]).into_dyn());
    }
}
