//! Pure conversion functions: TOML config structs -> crate API config types.

use anyhow::{Context, Result, bail};

use cmbs_field::Region;
use cmbs_io::LoadConfig;
use cmbs_regress::RegressionConfig;
use cmbs_time::timestamp_from_ymd;

use crate::config::{AnalysisToml, InputToml, RegionToml};

/// Parses a `YYYY-MM-DD` date into a timestamp.
pub fn parse_date(s: &str) -> Result<f64> {
    let parts: Vec<&str> = s.trim().split('-').collect();
    let [y, m, d] = parts.as_slice() else {
        bail!("expected a date as YYYY-MM-DD, got {s:?}");
    };
    let year: i32 = y.parse().with_context(|| format!("invalid year in {s:?}"))?;
    let month: u32 = m.parse().with_context(|| format!("invalid month in {s:?}"))?;
    let day: u32 = d.parse().with_context(|| format!("invalid day in {s:?}"))?;
    Ok(timestamp_from_ymd(year, month, day)?)
}

/// Builds a [`LoadConfig`] from the TOML input section.
pub fn build_load_config(input: &InputToml) -> Result<LoadConfig> {
    let mut cfg = LoadConfig::new(&input.variable)
        .with_scale_factor(input.scale_factor)
        .with_shift_lon(input.shift_lon)
        .with_squeeze(input.squeeze);
    match (&input.lat, &input.lon) {
        (Some(lat), Some(lon)) => cfg = cfg.with_coordinates(lat, lon),
        (None, None) => {}
        _ => bail!("input.lat and input.lon must be given together"),
    }
    if let Some(ref label) = input.label {
        cfg = cfg.with_label(label);
    }
    if let Some(ref unit) = input.unit {
        cfg = cfg.with_unit(unit);
    }
    match (&input.start, &input.stop) {
        (Some(start), Some(stop)) => {
            cfg = cfg.with_time_range(parse_date(start)?, parse_date(stop)?);
        }
        (None, None) => {}
        _ => bail!("input.start and input.stop must be given together"),
    }
    if let Some(cycle) = input.time_cycle {
        cfg = cfg.with_time_cycle(cycle);
    }
    if let Some(level) = input.level {
        cfg = cfg.with_level(level);
    }
    cfg.validate()?;
    Ok(cfg)
}

/// Converts a TOML region into a [`Region`].
///
/// Exactly one of `bbox` or `index` must be set.
pub fn build_region(r: &RegionToml) -> Result<Region> {
    let region = match (r.bbox, r.index) {
        (Some([lonmin, lonmax, latmin, latmax]), None) => {
            Region::lat_lon(r.id, &r.label, lonmin, lonmax, latmin, latmax)?
        }
        (None, Some([x1, x2, y1, y2])) => Region::index(r.id, &r.label, x1, x2, y1, y2)?,
        (Some(_), Some(_)) => bail!("region must have exactly one of bbox or index, got both"),
        (None, None) => bail!("region must have exactly one of bbox or index, got neither"),
    };
    Ok(region)
}

/// Builds a [`RegressionConfig`] from the TOML analysis section.
pub fn build_regression_config(a: &AnalysisToml) -> Result<RegressionConfig> {
    let cfg = RegressionConfig::new()
        .with_threshold(a.threshold)
        .with_parallel(a.parallel);
    cfg.validate()?;
    Ok(cfg)
}
