//! Summary statistics over a computed MTR series.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::profile::MtrResult;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct SeriesStats {
    pub points: usize,
    /// Timestamps whose MTR is NaN.
    pub missing: usize,
    pub first: Option<DateTime<Utc>>,
    pub last: Option<DateTime<Utc>>,
    pub mean_mtr: f64,
    pub stddev_mtr: f64,
    pub max_mtr: f64,
    pub peak_at: Option<DateTime<Utc>>,
}

impl SeriesStats {
    pub fn from_series(series: &[MtrResult]) -> Self {
        let valid: Vec<&MtrResult> = series.iter().filter(|r| !r.is_missing()).collect();
        let values: Vec<f64> = valid.iter().map(|r| r.mtr).collect();

        let avg = mean(&values);
        let peak = valid
            .iter()
            .copied()
            .max_by(|a, b| a.mtr.total_cmp(&b.mtr));

        SeriesStats {
            points: series.len(),
            missing: series.len() - valid.len(),
            first: series.first().map(|r| r.datetime),
            last: series.last().map(|r| r.datetime),
            mean_mtr: avg,
            stddev_mtr: stddev(&values, avg),
            max_mtr: peak.map(|r| r.mtr).unwrap_or(0.0),
            peak_at: peak.map(|r| r.datetime),
        }
    }

    /// Share of timestamps with a defined MTR, in percent.
    pub fn coverage_pct(&self) -> f64 {
        pct(self.points - self.missing, self.points)
    }
}

pub fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Computes the population standard deviation given a pre-computed mean.
/// Returns 0.0 for empty input.
pub fn stddev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;

    variance.sqrt()
}
