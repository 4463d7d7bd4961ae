//! Selection of usable cells.

use cmbs_field::MaskedGridField;
use ndarray::Array2;
use tracing::debug;

/// Which cells count as valid when flattening a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidityMode {
    /// Valid in every time step.
    All,
    /// Valid in at least one time step.
    One,
}

/// The selected cells of a field, flattened to `(time, cell)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidData {
    /// Longitudes of the selected cells, when the field carries coordinates.
    pub lon: Option<Vec<f64>>,
    /// Latitudes of the selected cells, when the field carries coordinates.
    pub lat: Option<Vec<f64>>,
    /// Values of the selected cells, one row per time step.
    pub data: Array2<f64>,
    /// Mask of `data` (`true` = invalid).
    pub data_mask: Array2<bool>,
    /// Per-cell flag over all cells in row-major order; `true` = selected.
    pub selection: Vec<bool>,
}

impl ValidData {
    /// Number of selected cells.
    pub fn n_selected(&self) -> usize {
        self.data.ncols()
    }
}

/// Flattens the spatial axes and keeps the cells valid under `mode`.
///
/// Coordinates are returned only when they can be expanded to the spatial
/// shape.
pub fn get_valid_data(field: &MaskedGridField, mode: ValidityMode) -> ValidData {
    let selection: Vec<bool> = field
        .valid_mask(mode == ValidityMode::All)
        .iter()
        .copied()
        .collect();
    let columns: Vec<usize> = selection
        .iter()
        .enumerate()
        .filter_map(|(i, &s)| s.then_some(i))
        .collect();

    let (data, mask) = field.flatten_spatial();
    let rows = data.nrows();
    let data = Array2::from_shape_fn((rows, columns.len()), |(t, j)| data[[t, columns[j]]]);
    let data_mask = Array2::from_shape_fn((rows, columns.len()), |(t, j)| mask[[t, columns[j]]]);

    let (lat, lon) = match field.coordinate_grids() {
        Ok((lat, lon)) => {
            let pick = |grid: &ndarray::ArrayD<f64>| -> Vec<f64> {
                let flat: Vec<f64> = grid.iter().copied().collect();
                columns.iter().map(|&c| flat[c]).collect()
            };
            (Some(pick(&lat)), Some(pick(&lon)))
        }
        Err(_) => (None, None),
    };

    debug!(
        cells = selection.len(),
        selected = columns.len(),
        ?mode,
        "valid data selection"
    );
    ValidData {
        lon,
        lat,
        data,
        data_mask,
        selection,
    }
}
