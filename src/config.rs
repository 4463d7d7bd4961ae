use std::path::PathBuf;

use serde::Deserialize;

/// Top-level cmbs configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CmbsConfig {
    /// What to load.
    pub input: InputToml,

    /// Optional region of interest.
    #[serde(default)]
    pub region: Option<RegionToml>,

    /// Analysis settings.
    #[serde(default)]
    pub analysis: AnalysisToml,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputToml {
    pub path: PathBuf,
    pub variable: String,
    pub lat: Option<String>,
    pub lon: Option<String>,
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,
    pub label: Option<String>,
    pub unit: Option<String>,
    #[serde(default)]
    pub shift_lon: bool,
    /// Start date, `YYYY-MM-DD`.
    pub start: Option<String>,
    /// Stop date, `YYYY-MM-DD`.
    pub stop: Option<String>,
    pub time_cycle: Option<usize>,
    #[serde(default)]
    pub squeeze: bool,
    pub level: Option<usize>,
}

fn default_scale_factor() -> f64 {
    1.0
}

/// Region specification: exactly one of `bbox` or `index` should be set.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegionToml {
    #[serde(default = "default_region_id")]
    pub id: u32,
    #[serde(default = "default_region_label")]
    pub label: String,
    /// `[lonmin, lonmax, latmin, latmax]`.
    pub bbox: Option<[f64; 4]>,
    /// `[x1, x2, y1, y2]`, half-open.
    pub index: Option<[usize; 4]>,
}

fn default_region_id() -> u32 {
    1
}
fn default_region_label() -> String {
    "region".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisToml {
    /// Report deseasonalized anomalies (needs `input.time_cycle`).
    #[serde(default)]
    pub anomalies: bool,
    /// Months (1..=12) included in the yearly means; all when absent.
    #[serde(default)]
    pub season: Option<Vec<u32>>,
    /// p-value above which trends count as insignificant.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_true")]
    pub parallel: bool,
}

impl Default for AnalysisToml {
    fn default() -> Self {
        Self {
            anomalies: false,
            season: None,
            threshold: default_threshold(),
            parallel: true,
        }
    }
}

fn default_threshold() -> f64 {
    0.05
}
fn default_true() -> bool {
    true
}
