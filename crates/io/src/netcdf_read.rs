//! NetCDF-backed [`GridReader`].

use std::path::{Path, PathBuf};

use netcdf::AttributeValue;
use tracing::debug;

use crate::error::IoError;
use crate::reader::{GridReader, RawTime, ReadResult, ScaleOffset, select_level};

/// Name of the time variable looked up in every file.
const TIME_VAR: &str = "time";

/// Reads variables from NetCDF files; the `source` is a file path.
///
/// Honours the `_FillValue`, `scale_factor`, `add_offset` and `units`
/// attributes of the variable and the `units` attribute of `time`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetcdfReader;

impl NetcdfReader {
    pub fn new() -> Self {
        Self
    }
}

impl GridReader for NetcdfReader {
    fn read(
        &self,
        source: &str,
        variable: &str,
        level: Option<usize>,
    ) -> Result<Option<ReadResult>, IoError> {
        let path = Path::new(source);
        let file = open_file(path)?;
        let Some(var) = file.variable(variable) else {
            debug!(path = %path.display(), variable, "variable not present");
            return Ok(None);
        };

        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        let values = var.get_values::<f64, _>(..)?;
        let (values, shape) = select_level(variable, values, shape, level)?;

        let scale = attribute_f64(&var, "scale_factor")?.unwrap_or(1.0);
        let offset = attribute_f64(&var, "add_offset")?.unwrap_or(0.0);
        let time = match file.variable(TIME_VAR) {
            Some(tvar) => Some(RawTime {
                values: tvar.get_values::<f64, _>(..)?,
                units: attribute_string(&tvar, "units")?,
            }),
            None => None,
        };

        Ok(Some(ReadResult {
            values,
            shape,
            fill_value: attribute_f64(&var, "_FillValue")?,
            scale_offset: ScaleOffset { scale, offset },
            units: attribute_string(&var, "units")?,
            time,
        }))
    }
}

/// Open a NetCDF file at `path`, returning [`IoError::FileNotFound`] if the
/// path does not exist on disk.
fn open_file(path: &Path) -> Result<netcdf::File, IoError> {
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: PathBuf::from(path),
        });
    }
    Ok(netcdf::open(path)?)
}

fn attribute_string(var: &netcdf::Variable<'_>, name: &str) -> Result<Option<String>, IoError> {
    match var.attribute_value(name) {
        None => Ok(None),
        Some(value) => match value? {
            AttributeValue::Str(s) => Ok(Some(s)),
            other => Err(IoError::InvalidAttribute {
                name: name.to_string(),
                reason: format!("expected a string, got {other:?}"),
            }),
        },
    }
}

/// Reads a scalar numeric attribute.
///
/// String values are parsed after replacing a `.f` suffix with `.`
/// (e.g. `"1.f"`).
fn attribute_f64(var: &netcdf::Variable<'_>, name: &str) -> Result<Option<f64>, IoError> {
    let Some(value) = var.attribute_value(name) else {
        return Ok(None);
    };
    let v = match value? {
        AttributeValue::Double(v) => v,
        AttributeValue::Float(v) => f64::from(v),
        AttributeValue::Int(v) => f64::from(v),
        AttributeValue::Uint(v) => f64::from(v),
        AttributeValue::Short(v) => f64::from(v),
        AttributeValue::Ushort(v) => f64::from(v),
        AttributeValue::Schar(v) => f64::from(v),
        AttributeValue::Uchar(v) => f64::from(v),
        AttributeValue::Longlong(v) => v as f64,
        AttributeValue::Ulonglong(v) => v as f64,
        AttributeValue::Doubles(v) if v.len() == 1 => v[0],
        AttributeValue::Floats(v) if v.len() == 1 => f64::from(v[0]),
        AttributeValue::Str(s) => parse_numeric_string(&s).ok_or_else(|| {
            IoError::InvalidAttribute {
                name: name.to_string(),
                reason: format!("cannot parse '{s}' as a number"),
            }
        })?,
        other => {
            return Err(IoError::InvalidAttribute {
                name: name.to_string(),
                reason: format!("expected a scalar number, got {other:?}"),
            });
        }
    };
    Ok(Some(v))
}

fn parse_numeric_string(s: &str) -> Option<f64> {
    s.trim().replace(".f", ".").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_reported() {
        let reader = NetcdfReader::new();
        let result = reader.read("/tmp/cmbs_test_nonexistent_file.nc", "tas", None);
        assert!(matches!(result, Err(IoError::FileNotFound { .. })));
    }

    #[test]
    fn numeric_strings_with_float_suffix() {
        assert_eq!(parse_numeric_string("1.f"), Some(1.0));
        assert_eq!(parse_numeric_string("0.5"), Some(0.5));
        assert_eq!(parse_numeric_string("abc"), None);
    }
}
