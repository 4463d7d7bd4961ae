//! JSON summary written by `cmbs inspect`.

use anyhow::{Context, Result};
use serde::Serialize;

use cmbs_field::MaskedGridField;
use cmbs_time::datetime_from_timestamp;

/// Top-level inspection output.
#[derive(Debug, Serialize)]
pub struct InspectReport {
    pub source: String,
    pub variable: String,
    pub label: String,
    pub unit: Option<String>,
    pub geometry: String,
    pub shape: Vec<usize>,
    pub n_valid: usize,
    pub period: Option<Period>,
    pub region: Option<String>,
    /// Summary of the field-mean series.
    pub field_mean: SeriesSummary,
    pub yearly_means: Vec<YearValue>,
    /// Summary of the field-mean anomaly series, when requested.
    pub anomaly: Option<SeriesSummary>,
    pub trend: Option<TrendSummary>,
}

/// First and last timestamp as `YYYY-MM-DD`.
#[derive(Debug, Serialize)]
pub struct Period {
    pub start: String,
    pub end: String,
    pub n_steps: usize,
}

/// Summary statistics of a series' valid values.
#[derive(Debug, Serialize, PartialEq)]
pub struct SeriesSummary {
    pub n_valid: usize,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct YearValue {
    pub year: i32,
    pub value: Option<f64>,
}

/// Linear trend of the field-mean series plus per-cell trend counts.
#[derive(Debug, Serialize)]
pub struct TrendSummary {
    /// Slope per time step of the field-mean series.
    pub slope: f64,
    pub intercept: f64,
    pub r: f64,
    pub p_value: f64,
    /// Standard error of the slope.
    pub std_err: f64,
    /// Valid steps of the field-mean series used in the fit.
    pub n_steps: usize,
    /// Cells with a per-cell trend fit.
    pub cells_fitted: usize,
    /// Cells whose trend passes the significance threshold.
    pub cells_significant: usize,
    /// Mean per-cell slope over significant cells.
    pub mean_significant_slope: Option<f64>,
}

impl SeriesSummary {
    pub fn of(field: &MaskedGridField) -> Self {
        let valid: Vec<f64> = field
            .data()
            .iter()
            .zip(field.mask())
            .filter(|(_, m)| !**m)
            .map(|(v, _)| *v)
            .collect();
        if valid.is_empty() {
            return Self {
                n_valid: 0,
                mean: None,
                min: None,
                max: None,
            };
        }
        Self {
            n_valid: valid.len(),
            mean: Some(cmbs_stats::mean(&valid)),
            min: valid.iter().copied().reduce(f64::min),
            max: valid.iter().copied().reduce(f64::max),
        }
    }
}

impl Period {
    pub fn of(time: &[f64]) -> Option<Self> {
        let date = |t: f64| datetime_from_timestamp(t).map(|dt| dt.date().to_string());
        Some(Self {
            start: date(*time.first()?)?,
            end: date(*time.last()?)?,
            n_steps: time.len(),
        })
    }
}

/// Serializes the report as pretty-printed JSON.
pub fn to_json(report: &InspectReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize inspection report")
}
