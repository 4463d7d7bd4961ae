//! Elementwise arithmetic between fields and with constants.
//!
//! Every binary operation goes through [`resolve_broadcast`]. The result mask
//! is the union of the operand masks plus every cell whose result is not
//! finite (e.g. a division by zero). Results of field-with-field operations
//! carry no cached climatology.

use ndarray::{ArrayD, ArrayViewD, Zip};

use crate::error::FieldError;
use crate::field::MaskedGridField;
use crate::geometry::{Broadcast, resolve_broadcast};

#[derive(Debug, Clone, Copy)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }

    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Add => a + b,
            Self::Sub => a - b,
            Self::Mul => a * b,
            Self::Div => a / b,
        }
    }
}

impl MaskedGridField {
    fn combine(
        &self,
        other: &MaskedGridField,
        op: BinaryOp,
    ) -> Result<(ArrayD<f64>, ArrayD<bool>), FieldError> {
        let (rhs_data, rhs_mask): (ArrayViewD<'_, f64>, ArrayViewD<'_, bool>) =
            match resolve_broadcast(op.name(), self.shape(), other.shape())? {
                Broadcast::Identical => (other.data().view(), other.mask().view()),
                Broadcast::AcrossTime => {
                    let dim = self.data().raw_dim();
                    let mismatch = || FieldError::DimensionMismatch {
                        operation: op.name(),
                        expected: self.shape().to_vec(),
                        got: other.shape().to_vec(),
                    };
                    (
                        other.data().broadcast(dim.clone()).ok_or_else(mismatch)?,
                        other.mask().broadcast(dim).ok_or_else(mismatch)?,
                    )
                }
            };

        let data = Zip::from(self.data())
            .and(&rhs_data)
            .map_collect(|&a, &b| op.apply(a, b));
        let mask = Zip::from(self.mask())
            .and(&rhs_mask)
            .and(&data)
            .map_collect(|&m1, &m2, &v| m1 || m2 || !v.is_finite());
        Ok((data, mask))
    }

    fn binary(&self, other: &MaskedGridField, op: BinaryOp) -> Result<MaskedGridField, FieldError> {
        let (data, mask) = self.combine(other, op)?;
        let mut out = self.replace_values(data, mask);
        out.set_climatology_raw(None);
        out.set_label(format!("{} {} {}", self.label(), op.symbol(), other.label()));
        Ok(out)
    }

    fn binary_in_place(&mut self, other: &MaskedGridField, op: BinaryOp) -> Result<(), FieldError> {
        let (data, mask) = self.combine(other, op)?;
        self.set_arrays(data, mask);
        self.set_climatology_raw(None);
        let label = format!("{} {} {}", self.label(), op.symbol(), other.label());
        self.set_label(label);
        Ok(())
    }

    fn constant(&self, c: f64, op: BinaryOp) -> (ArrayD<f64>, ArrayD<bool>) {
        let data = self.data().mapv(|a| op.apply(a, c));
        let mask = Zip::from(self.mask())
            .and(&data)
            .map_collect(|&m, &v| m || !v.is_finite());
        (data, mask)
    }

    /// `self + other`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::DimensionMismatch`] unless shapes are equal or
    /// `other` is a map matching the grid of a cube `self`.
    pub fn add(&self, other: &MaskedGridField) -> Result<MaskedGridField, FieldError> {
        self.binary(other, BinaryOp::Add)
    }

    /// `self - other`. See [`Self::add`] for the shape rules.
    pub fn sub(&self, other: &MaskedGridField) -> Result<MaskedGridField, FieldError> {
        self.binary(other, BinaryOp::Sub)
    }

    /// `self * other`. See [`Self::add`] for the shape rules.
    pub fn mul(&self, other: &MaskedGridField) -> Result<MaskedGridField, FieldError> {
        self.binary(other, BinaryOp::Mul)
    }

    /// `self / other`. Cells divided by zero become invalid.
    pub fn div(&self, other: &MaskedGridField) -> Result<MaskedGridField, FieldError> {
        self.binary(other, BinaryOp::Div)
    }

    pub fn add_in_place(&mut self, other: &MaskedGridField) -> Result<(), FieldError> {
        self.binary_in_place(other, BinaryOp::Add)
    }

    pub fn sub_in_place(&mut self, other: &MaskedGridField) -> Result<(), FieldError> {
        self.binary_in_place(other, BinaryOp::Sub)
    }

    pub fn mul_in_place(&mut self, other: &MaskedGridField) -> Result<(), FieldError> {
        self.binary_in_place(other, BinaryOp::Mul)
    }

    pub fn div_in_place(&mut self, other: &MaskedGridField) -> Result<(), FieldError> {
        self.binary_in_place(other, BinaryOp::Div)
    }

    pub fn add_constant(&self, c: f64) -> MaskedGridField {
        let (data, mask) = self.constant(c, BinaryOp::Add);
        self.replace_values(data, mask)
    }

    pub fn sub_constant(&self, c: f64) -> MaskedGridField {
        let (data, mask) = self.constant(c, BinaryOp::Sub);
        self.replace_values(data, mask)
    }

    pub fn mul_constant(&self, c: f64) -> MaskedGridField {
        let (data, mask) = self.constant(c, BinaryOp::Mul);
        self.replace_values(data, mask)
    }

    pub fn add_constant_in_place(&mut self, c: f64) {
        let (data, mask) = self.constant(c, BinaryOp::Add);
        self.set_arrays(data, mask);
    }

    pub fn sub_constant_in_place(&mut self, c: f64) {
        let (data, mask) = self.constant(c, BinaryOp::Sub);
        self.set_arrays(data, mask);
    }

    pub fn mul_constant_in_place(&mut self, c: f64) {
        let (data, mask) = self.constant(c, BinaryOp::Mul);
        self.set_arrays(data, mask);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{arr1, arr2, arr3};

    fn field(data: ArrayD<f64>, label: &str) -> MaskedGridField {
        MaskedGridField::from_values(data).unwrap().with_label(label)
    }

    #[test]
    fn sub_identical_shapes() {
        let a = field(arr2(&[[5.0, 7.0], [1.0, 2.0]]).into_dyn(), "A");
        let b = field(arr2(&[[1.0, 2.0], [1.0, 1.0]]).into_dyn(), "B");
        let d = a.sub(&b).unwrap();
        assert_eq!(d.data(), &arr2(&[[4.0, 5.0], [0.0, 1.0]]).into_dyn());
        assert_eq!(d.label(), "A - B");
    }

    #[test]
    fn div_by_map_broadcasts_across_time() {
        let a = field(arr3(&[[[2.0, 4.0]], [[6.0, 8.0]]]).into_dyn(), "A");
        let b = field(arr2(&[[2.0, 0.0]]).into_dyn(), "B");
        let q = a.div(&b).unwrap();
        assert_eq!(q.shape(), &[2, 1, 2]);
        assert_relative_eq!(q.data()[[1, 0, 0]], 3.0);
        // Division by zero is masked.
        assert!(q.mask()[[0, 0, 1]]);
        assert!(q.mask()[[1, 0, 1]]);
        assert!(!q.mask()[[1, 0, 0]]);
        assert_eq!(q.label(), "A / B");
    }

    #[test]
    fn masks_are_unioned() {
        let a = MaskedGridField::new(
            arr1(&[1.0, 2.0, 3.0]).into_dyn(),
            arr1(&[true, false, false]).into_dyn(),
        )
        .unwrap();
        let b = MaskedGridField::new(
            arr1(&[1.0, 2.0, 3.0]).into_dyn(),
            arr1(&[false, false, true]).into_dyn(),
        )
        .unwrap();
        let s = a.add(&b).unwrap();
        assert_eq!(s.mask(), &arr1(&[true, false, true]).into_dyn());
    }

    #[test]
    fn mismatched_shapes_fail() {
        let a = field(arr2(&[[1.0, 2.0]]).into_dyn(), "A");
        let b = field(arr1(&[1.0, 2.0]).into_dyn(), "B");
        assert!(matches!(
            a.mul(&b),
            Err(FieldError::DimensionMismatch { operation: "mul", .. })
        ));
    }

    #[test]
    fn in_place_updates_label_and_values() {
        let mut a = field(arr1(&[1.0, 2.0]).into_dyn(), "A");
        let b = field(arr1(&[3.0, 4.0]).into_dyn(), "B");
        a.mul_in_place(&b).unwrap();
        assert_eq!(a.data(), &arr1(&[3.0, 8.0]).into_dyn());
        assert_eq!(a.label(), "A * B");
    }

    #[test]
    fn field_results_drop_cached_climatology() {
        let mut a = field(arr3(&[[[1.0, 2.0]], [[3.0, 4.0]]]).into_dyn(), "A")
            .with_time(vec![0.0, 1.0])
            .unwrap()
            .with_time_cycle(1);
        a.cache_climatology().unwrap();
        let b = field(arr2(&[[1.0, 1.0]]).into_dyn(), "B");

        let d = a.sub(&b).unwrap();
        assert!(d.climatology_raw().is_none());
        assert!(a.climatology_raw().is_some());

        a.add_in_place(&b).unwrap();
        assert!(a.climatology_raw().is_none());
    }

    #[test]
    fn constants() {
        let a = field(arr1(&[1.0, 2.0]).into_dyn(), "A");
        assert_eq!(a.add_constant(1.0).data(), &arr1(&[2.0, 3.0]).into_dyn());
        assert_eq!(a.sub_constant(1.0).data(), &arr1(&[0.0, 1.0]).into_dyn());
        assert_eq!(a.mul_constant(2.0).data(), &arr1(&[2.0, 4.0]).into_dyn());

        let mut b = a.clone();
        b.mul_constant_in_place(f64::INFINITY);
        assert!(b.mask().iter().all(|&m| m));
        assert_eq!(a.label(), "A");
    }
}
