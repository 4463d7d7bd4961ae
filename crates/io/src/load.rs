//! The ingestion pipeline: from a stored variable to a ready field.

use cmbs_field::MaskedGridField;
use cmbs_time::resolve_time;
use ndarray::{ArrayD, Zip};
use tracing::{debug, info, instrument, warn};

use crate::config::LoadConfig;
use crate::error::IoError;
use crate::reader::{GridReader, ReadResult};

/// Reads and prepares one variable.
///
/// Steps, in order:
///
/// 1. read the variable (selecting `level` for 4-D data)
/// 2. mark fill values and non-finite values invalid
/// 3. unpack with `value * scale + offset`, then apply the user scale factor
/// 4. attach the decoded time axis when its length matches the leading axis
/// 5. squeeze singleton axes (if configured)
/// 6. apply the input mask
/// 7. attach coordinates, shifting longitudes if configured
/// 8. mesh 1-D coordinates (best effort)
/// 9. cache the climatology of the full record (if a time cycle is set)
/// 10. subset to the configured time range
///
/// # Errors
///
/// Returns [`IoError::ResourceNotFound`] if the variable is absent,
/// [`IoError::Validation`] for an invalid `config`, and any error from the
/// reader, the time decoder or the field operations.
#[instrument(skip_all, fields(source = source, variable = config.variable()))]
pub fn load_field<R: GridReader + ?Sized>(
    reader: &R,
    source: &str,
    config: &LoadConfig,
) -> Result<MaskedGridField, IoError> {
    config.validate()?;

    // -- Data -----------------------------------------------------------------

    let raw = reader
        .read(source, config.variable(), config.level())?
        .ok_or_else(|| IoError::ResourceNotFound {
            name: config.variable().to_string(),
            location: source.to_string(),
        })?;
    let (data, mask) = unpack(&raw, config.variable(), config.scale_factor())?;

    let mut field = MaskedGridField::new(data, mask)?
        .with_label(config.label().unwrap_or(config.variable()));
    if let Some(unit) = config.unit().or(raw.units.as_deref()) {
        field = field.with_unit(unit);
    }
    if let Some(fill) = raw.fill_value {
        field = field.with_fill_value(fill);
    }

    // -- Time -----------------------------------------------------------------

    if let Some(raw_time) = &raw.time {
        let time = resolve_time(raw_time.units.as_deref(), &raw_time.values)?;
        if field.shape().first() == Some(&time.len()) {
            field = field.with_time(time)?;
        } else {
            debug!(
                nt = time.len(),
                shape = ?field.shape(),
                "time axis does not match leading dimension; ignored"
            );
        }
    }

    // -- Shape and mask -------------------------------------------------------

    if config.squeeze() {
        field.squeeze();
    }
    if let Some(valid) = config.mask() {
        field.apply_mask(valid, true)?;
    }

    // -- Coordinates ----------------------------------------------------------

    let lat = read_coordinate(reader, source, config.lat_name())?;
    let lon = read_coordinate(reader, source, config.lon_name())?;
    match (lat, lon) {
        (Some(lat), Some(lon)) => {
            field = field.with_coordinates(lat, lon);
            if config.shift_lon() {
                field.normalize_longitude();
            }
            if let Err(e) = field.try_mesh_coordinates() {
                warn!(error = %e, "no lat/lon mesh was generated");
            }
        }
        (None, None) => {}
        _ => warn!("only one of lat/lon is available; coordinates dropped"),
    }

    // -- Climatology and subsetting -------------------------------------------

    if let Some(cycle) = config.time_cycle() {
        field = field.with_time_cycle(cycle);
        if field.nt().is_some() {
            field.cache_climatology()?;
        }
    }
    if field.time().is_some() {
        field.subset_time_in_place(config.start_time(), config.stop_time())?;
    }

    info!(
        shape = ?field.shape(),
        valid = field.n_valid(),
        geometry = ?field.geometry(),
        "loaded field"
    );
    Ok(field)
}

/// Masks fill and non-finite values and unpacks the rest.
fn unpack(
    raw: &ReadResult,
    name: &str,
    user_scale: f64,
) -> Result<(ArrayD<f64>, ArrayD<bool>), IoError> {
    let mut data = raw.to_array(name)?;
    let mask = data.mapv(|v| !v.is_finite() || raw.fill_value.is_some_and(|f| v == f));
    Zip::from(&mut data).and(&mask).for_each(|v, &invalid| {
        *v = if invalid {
            f64::NAN
        } else {
            raw.scale_offset.apply(*v) * user_scale
        };
    });
    Ok((data, mask))
}

fn read_coordinate<R: GridReader + ?Sized>(
    reader: &R,
    source: &str,
    name: Option<&str>,
) -> Result<Option<ArrayD<f64>>, IoError> {
    let Some(name) = name else {
        return Ok(None);
    };
    match reader.read(source, name, None)? {
        Some(raw) => Ok(Some(raw.to_array(name)?)),
        None => {
            warn!(name, "coordinate variable not found");
            Ok(None)
        }
    }
}
