//! Run configuration loaded from a JSON file.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::mtr::{DirectionWeighting, MtrError, MtrParams, check_interval};
use crate::render::ChartConfig;

/// Optional overrides of the MTR parameters and chart size.
///
/// Stored as a plain JSON object on disk; every key may be omitted:
/// ```json
/// {
///   "alt_min": 200,
///   "alt_max": 2000,
///   "interval": 200,
///   "vvp_thresh": 2,
///   "alpha": 200,
///   "weighting": "radians",
///   "chart_width": 900,
///   "chart_height": 320
/// }
/// ```
/// An absent `alt_max` means no upper bound. A value of the wrong JSON type
/// (e.g. `"alt_min": "low"`) fails deserialization in [`RunConfig::load`];
/// a numeric but invalid `interval` fails in [`RunConfig::mtr_params`].
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub alt_min: Option<f64>,
    pub alt_max: Option<f64>,
    pub interval: Option<f64>,
    pub vvp_thresh: Option<f64>,
    pub alpha: Option<f64>,
    pub weighting: Option<DirectionWeighting>,
    pub chart_width: Option<u32>,
    pub chart_height: Option<u32>,
}

impl RunConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {path}"))?;
        Self::from_json(&content).with_context(|| format!("invalid config {path}"))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// MTR parameters with this file's values layered over the defaults.
    ///
    /// # Errors
    ///
    /// [`MtrError::InvalidArgument`] when `interval` is not a finite positive number.
    pub fn mtr_params(&self) -> Result<MtrParams, MtrError> {
        let defaults = MtrParams::default();
        let interval = match self.interval {
            Some(interval) => check_interval(interval)?,
            None => defaults.interval,
        };
        Ok(MtrParams {
            alt_min: self.alt_min.unwrap_or(defaults.alt_min),
            alt_max: self.alt_max.unwrap_or(defaults.alt_max),
            interval,
            vvp_thresh: self.vvp_thresh.unwrap_or(defaults.vvp_thresh),
            alpha: self.alpha.or(defaults.alpha),
            weighting: self.weighting.unwrap_or(defaults.weighting),
        })
    }

    /// Applies the configured chart size to `chart`.
    pub fn chart(&self, chart: ChartConfig) -> ChartConfig {
        let chart = match self.chart_width {
            Some(w) => chart.with_width(w),
            None => chart,
        };
        match self.chart_height {
            Some(h) => chart.with_height(h),
            None => chart,
        }
    }
}
