//! Inspect command: load one variable and summarize it.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, info_span, warn};

use cmbs_field::{AnomalyBase, MaskedGridField, RegionBounds};
use cmbs_io::{GridReader, load_field};
use cmbs_regress::{RegressionConfig, corr_single};
use cmbs_stats::linear_regression;

use crate::cli::InspectArgs;
use crate::config::CmbsConfig;
use crate::convert;
use crate::report::{InspectReport, Period, SeriesSummary, TrendSummary, YearValue, to_json};

/// Run the inspection pipeline.
pub fn run(args: InspectArgs) -> Result<()> {
    let _cmd = info_span!("inspect").entered();

    let toml_str = std::fs::read_to_string(&args.config)
        .with_context(|| format!("failed to read config file: {}", args.config.display()))?;
    let config: CmbsConfig = toml::from_str(&toml_str).context("failed to parse TOML config")?;

    let report = inspect_netcdf(&config)?;
    let json = to_json(&report)?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, &json)
                .with_context(|| format!("failed to write summary: {}", path.display()))?;
            info!(path = %path.display(), "summary written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

#[cfg(feature = "netcdf")]
fn inspect_netcdf(config: &CmbsConfig) -> Result<InspectReport> {
    inspect(&cmbs_io::NetcdfReader::new(), config)
}

#[cfg(not(feature = "netcdf"))]
fn inspect_netcdf(config: &CmbsConfig) -> Result<InspectReport> {
    anyhow::bail!(
        "cannot read {}: cmbs was built without NetCDF support (rebuild with --features netcdf)",
        config.input.path.display()
    )
}

/// Loads the configured variable through `reader` and builds the report.
#[cfg_attr(not(feature = "netcdf"), allow(dead_code))]
pub fn inspect<R: GridReader + ?Sized>(reader: &R, config: &CmbsConfig) -> Result<InspectReport> {
    let load_cfg = convert::build_load_config(&config.input)?;
    let regress_cfg = convert::build_regression_config(&config.analysis)?;
    let source = source_name(&config.input.path)?;

    info!(source, variable = %config.input.variable, "loading field");
    let mut field = load_field(reader, source, &load_cfg)
        .with_context(|| format!("failed to load '{}' from {source}", config.input.variable))?;

    // -- Region ---------------------------------------------------------------

    let region_label = match &config.region {
        Some(r) => {
            let region = convert::build_region(r)?;
            field = match region.bounds() {
                RegionBounds::Index { .. } => field.region_subset(&region)?,
                RegionBounds::LatLon { .. } => {
                    field.apply_region_mask(&region)?;
                    field
                }
            };
            info!(region = region.label(), valid = field.n_valid(), "region applied");
            Some(region.label().to_string())
        }
        None => None,
    };

    // -- Summaries ------------------------------------------------------------

    let series = spatial_mean(&field)?;
    let yearly_means = yearly_means(&field, config.analysis.season.as_deref())?;
    let anomaly = if config.analysis.anomalies {
        let base = if field.climatology_raw().is_some() {
            AnomalyBase::All
        } else {
            AnomalyBase::Current
        };
        let anomaly = field
            .deseasonalized_anomaly(base)
            .context("anomalies need input.time_cycle")?;
        Some(SeriesSummary::of(&spatial_mean(&anomaly)?))
    } else {
        None
    };
    let trend = trend_summary(&field, &series, &regress_cfg)?;

    Ok(InspectReport {
        source: source.to_string(),
        variable: config.input.variable.clone(),
        label: field.label().to_string(),
        unit: field.unit().map(str::to_string),
        geometry: format!("{:?}", field.geometry()),
        shape: field.shape().to_vec(),
        n_valid: field.n_valid(),
        period: field.time().and_then(Period::of),
        region: region_label,
        field_mean: SeriesSummary::of(&series),
        yearly_means,
        anomaly,
        trend,
    })
}

fn source_name(path: &Path) -> Result<&str> {
    path.to_str()
        .with_context(|| format!("input path is not valid UTF-8: {}", path.display()))
}

/// Field mean per time step; fields without a `(y, x)` grid pass through.
fn spatial_mean(field: &MaskedGridField) -> Result<MaskedGridField> {
    if field.geometry().has_grid() {
        Ok(field.fldmean()?)
    } else {
        Ok(field.clone())
    }
}

fn yearly_means(field: &MaskedGridField, season: Option<&[u32]>) -> Result<Vec<YearValue>> {
    if field.nt().is_none() {
        return Ok(Vec::new());
    }
    let selection = season.map(|months| field.temporal_mask(months)).transpose()?;
    let yearly = field.yearmean(selection.as_deref())?;
    let means = spatial_mean(&yearly.field)?;
    let values: Vec<Option<f64>> = means
        .data()
        .iter()
        .zip(means.mask())
        .map(|(&v, &m)| (!m).then_some(v))
        .collect();
    Ok(yearly
        .years
        .iter()
        .zip(values)
        .map(|(&year, value)| YearValue { year, value })
        .collect())
}

/// Trend of the field-mean series and of every cell against the time index.
fn trend_summary(
    field: &MaskedGridField,
    series: &MaskedGridField,
    config: &RegressionConfig,
) -> Result<Option<TrendSummary>> {
    let Some(nt) = field.nt() else {
        return Ok(None);
    };
    if nt < config.min_samples() {
        warn!(nt, "series too short for a trend");
        return Ok(None);
    }
    let steps: Vec<f64> = (0..nt).map(|t| t as f64).collect();
    let values: Vec<f64> = series
        .data()
        .iter()
        .zip(series.mask())
        .map(|(&v, &m)| if m { f64::NAN } else { v })
        .collect();
    let Some(fit) = linear_regression(&steps, &values) else {
        warn!("no trend fit for the field-mean series");
        return Ok(None);
    };

    let cells = corr_single(field, &steps, None, config)?;
    let cells_fitted = cells.p_value.n_valid();
    let significant: Vec<f64> = cells
        .slope
        .data()
        .iter()
        .zip(cells.slope.mask())
        .filter(|(_, m)| !**m)
        .map(|(v, _)| *v)
        .collect();

    Ok(Some(TrendSummary {
        slope: fit.slope,
        intercept: fit.intercept,
        r: fit.r,
        p_value: fit.p_value,
        std_err: fit.std_err,
        n_steps: fit.n,
        cells_fitted,
        cells_significant: significant.len(),
        mean_significant_slope: (!significant.is_empty()).then(|| cmbs_stats::mean(&significant)),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmbs_io::{MemoryReader, RawTime, ReadResult};

    fn reader() -> MemoryReader {
        // 36 monthly steps on a 2x2 grid: seasonal cycle plus a trend in
        // the first column.
        let nt = 36;
        let values: Vec<f64> = (0..nt * 4)
            .map(|i| {
                let (t, c) = (i / 4, i % 4);
                let season = (t % 12) as f64;
                if c % 2 == 0 { season + 0.5 * t as f64 } else { season }
            })
            .collect();
        MemoryReader::new()
            .with_variable("grid.nc", "tas", ReadResult::new(values, vec![nt, 2, 2]))
            .with_variable("grid.nc", "lat", ReadResult::new(vec![0.0, 10.0], vec![2]))
            .with_variable("grid.nc", "lon", ReadResult::new(vec![0.0, 10.0], vec![2]))
            .with_time(
                "grid.nc",
                RawTime::new((0..nt).map(|t| t as f64).collect())
                    .with_units("months since 2000-01-01"),
            )
    }

    fn config(extra: &str) -> CmbsConfig {
        toml::from_str(&format!(
            r#"
            [input]
            path = "grid.nc"
            variable = "tas"
            lat = "lat"
            lon = "lon"
            time_cycle = 12
            {extra}
            "#
        ))
        .unwrap()
    }

    #[test]
    fn summary_of_monthly_grid() {
        let cfg = config("[analysis]\nanomalies = true\nparallel = false");
        let report = inspect(&reader(), &cfg).unwrap();
        assert_eq!(report.geometry, "Cube");
        assert_eq!(report.shape, vec![36, 2, 2]);
        assert_eq!(report.yearly_means.len(), 3);
        assert_eq!(report.yearly_means[0].year, 2000);
        let period = report.period.unwrap();
        assert_eq!(period.start, "2000-01-01");
        assert_eq!(period.end, "2002-12-01");

        let trend = report.trend.unwrap();
        assert_eq!(trend.cells_fitted, 4);
        assert_eq!(trend.n_steps, 36);
        assert!(trend.slope > 0.0);
        assert!(trend.std_err.is_finite() && trend.std_err > 0.0);
        assert!(report.anomaly.is_some());
    }

    #[test]
    fn index_region_restricts_grid() {
        let cfg = config("[region]\nlabel = \"west\"\nindex = [0, 1, 0, 2]");
        let report = inspect(&reader(), &cfg).unwrap();
        assert_eq!(report.shape, vec![36, 2, 1]);
        assert_eq!(report.region.as_deref(), Some("west"));
    }

    #[test]
    fn missing_variable_is_reported() {
        let mut cfg = config("");
        cfg.input.variable = "pr".into();
        let err = inspect(&reader(), &cfg).unwrap_err();
        assert!(format!("{err:#}").contains("'pr'"));
    }
}
