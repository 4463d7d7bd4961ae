//! Per-cell iteration over `(time, cell)` buffers.

use cmbs_field::{FieldError, MaskedGridField};
use ndarray::{Array2, ArrayD, Axis, IxDyn};
use rayon::prelude::*;

use crate::error::RegressError;

/// Indices of the cells with at least `min_samples` valid time steps in a
/// `(time, cell)` mask (`true` = invalid).
pub(crate) fn candidate_cells(invalid: &Array2<bool>, min_samples: usize) -> Vec<usize> {
    invalid
        .axis_iter(Axis(1))
        .enumerate()
        .filter(|(_, lane)| lane.iter().filter(|&&m| !m).count() >= min_samples)
        .map(|(cell, _)| cell)
        .collect()
}

/// Evaluates `f` for the `selected` cell indices, in parallel when
/// requested, and scatters the results into a vector over all `cells`.
/// Cells outside `selected` are `None`.
pub(crate) fn map_cells<T, F>(cells: usize, selected: &[usize], parallel: bool, f: F) -> Vec<Option<T>>
where
    T: Send,
    F: Fn(usize) -> Option<T> + Sync + Send,
{
    let evaluated: Vec<(usize, Option<T>)> = if parallel {
        selected.par_iter().map(|&cell| (cell, f(cell))).collect()
    } else {
        selected.iter().map(|&cell| (cell, f(cell))).collect()
    };
    let mut results: Vec<Option<T>> = (0..cells).map(|_| None).collect();
    for (cell, result) in evaluated {
        results[cell] = result;
    }
    results
}

/// Shape of a per-cell output; a bare series becomes a single point.
pub(crate) fn output_shape(field: &MaskedGridField) -> Vec<usize> {
    match field.spatial_shape() {
        [] => vec![1],
        s => s.to_vec(),
    }
}

/// Builds a per-cell output field, invalid wherever `select` yields `None`
/// or `masked` is set.
pub(crate) fn cell_field<T>(
    template: &MaskedGridField,
    results: &[Option<T>],
    select: impl Fn(&T) -> f64,
    masked: impl Fn(&T) -> bool,
) -> Result<MaskedGridField, RegressError> {
    let shape = output_shape(template);
    let (values, invalid): (Vec<f64>, Vec<bool>) = results
        .iter()
        .map(|r| match r {
            Some(r) if !masked(r) => (select(r), false),
            Some(r) => (select(r), true),
            None => (f64::NAN, true),
        })
        .unzip();
    let data = ArrayD::from_shape_vec(IxDyn(&shape), values).map_err(FieldError::from)?;
    let mask = ArrayD::from_shape_vec(IxDyn(&shape), invalid).map_err(FieldError::from)?;
    Ok(template.spatial_field(data, mask)?)
}
