//! Migration traffic rate (MTR) aggregation over one vertical profile.
//!
//! The MTR integrates `speed * density` over the retained altitude bins:
//!
//! ```text
//! mtr = 0.001 * interval * Σ weight * ff * dens * 3.6
//! ```
//!
//! Bins are retained when they lie inside the clamped altitude window and
//! their `sd_vvp` reaches the quality threshold. A profile with no retained
//! bin has an MTR of NaN.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::profile::{ProfileRecord, height_range};

/// m/s to km/h.
const KMH_PER_MS: f64 = 3.6;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MtrError {
    #[error("invalid argument {name}: {reason}")]
    InvalidArgument { name: &'static str, reason: String },
}

impl MtrError {
    fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        MtrError::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}

/// How the bearing of each bin is projected onto `alpha`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectionWeighting {
    /// `cos(radians(dd - alpha))`.
    #[default]
    Radians,
    /// `cos(dd - alpha) * PI / 180`, with the cosine taken of a degree value.
    /// Matches MTR values produced by the earlier JavaScript viewer.
    Legacy,
}

impl DirectionWeighting {
    fn weight(self, direction: f64, alpha: f64) -> f64 {
        match self {
            DirectionWeighting::Radians => (direction - alpha).to_radians().cos(),
            DirectionWeighting::Legacy => (direction - alpha).cos() * PI / 180.0,
        }
    }
}

/// Parameters of [`compute_mtr`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MtrParams {
    /// Lower bound of the altitude window, meters.
    pub alt_min: f64,
    /// Upper bound of the altitude window, meters. May be `+inf`.
    pub alt_max: f64,
    /// Bin thickness, meters.
    pub interval: f64,
    /// Minimum `sd_vvp` for a bin to count.
    pub vvp_thresh: f64,
    /// Direction of interest in degrees. `None` disables directional weighting.
    pub alpha: Option<f64>,
    pub weighting: DirectionWeighting,
}

impl Default for MtrParams {
    fn default() -> Self {
        Self {
            alt_min: 0.0,
            alt_max: f64::INFINITY,
            interval: 200.0,
            vvp_thresh: 2.0,
            alpha: None,
            weighting: DirectionWeighting::Radians,
        }
    }
}

impl MtrParams {
    /// Checks the altitude window bounds and `alpha`.
    ///
    /// # Errors
    ///
    /// [`MtrError::InvalidArgument`] when `alt_min` is not finite, `alt_max`
    /// is neither finite nor `+inf`, or `alpha` is set but not finite.
    pub fn validate(&self) -> Result<(), MtrError> {
        if !self.alt_min.is_finite() {
            return Err(MtrError::invalid(
                "alt_min",
                format!("expected a finite number, got {}", self.alt_min),
            ));
        }
        if self.alt_max.is_nan() || self.alt_max == f64::NEG_INFINITY {
            return Err(MtrError::invalid(
                "alt_max",
                format!("expected a finite number or +inf, got {}", self.alt_max),
            ));
        }
        if let Some(alpha) = self.alpha {
            if !alpha.is_finite() {
                return Err(MtrError::invalid(
                    "alpha",
                    format!("expected a finite angle in degrees, got {alpha}"),
                ));
            }
        }
        Ok(())
    }
}

/// Parses a textual numeric argument such as a CLI flag value.
///
/// `inf` and `infinity` are accepted; `NaN` and non-numeric text are not.
pub fn parse_argument(name: &'static str, text: &str) -> Result<f64, MtrError> {
    let trimmed = text.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if !value.is_nan() => Ok(value),
        _ => Err(MtrError::invalid(
            name,
            format!("{trimmed:?} is not numeric"),
        )),
    }
}

/// Checks a bin thickness supplied by the user: finite and positive.
///
/// [`compute_mtr`] itself accepts any interval; the CLI and config layers
/// pass user-supplied values through here.
pub fn check_interval(value: f64) -> Result<f64, MtrError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(MtrError::invalid(
            "interval",
            format!("expected a finite positive number of meters, got {value}"),
        ))
    }
}

/// Computes the migration traffic rate of one profile.
///
/// Returns NaN when no bin survives the altitude and `sd_vvp` filters,
/// including for an empty profile.
///
/// # Errors
///
/// See [`MtrParams::validate`]. A window with `alt_max <= alt_min` is only
/// logged as a warning.
pub fn compute_mtr(records: &[ProfileRecord], params: &MtrParams) -> Result<f64, MtrError> {
    params.validate()?;

    if params.alt_max <= params.alt_min {
        warn!(
            alt_min = params.alt_min,
            alt_max = params.alt_max,
            "alt_min should be smaller than alt_max"
        );
    }

    let Some((observed_min, observed_max)) = height_range(records) else {
        return Ok(f64::NAN);
    };

    // Heights are bin lower edges, so the top bin extends one interval up.
    let alt_min = params.alt_min.max(observed_min as f64);
    let alt_max = params.alt_max.min(observed_max as f64 + params.interval);

    let mut retained = 0usize;
    let mut total = 0.0;

    for r in records {
        let height = r.height as f64;
        // A NaN sd_vvp never passes the threshold.
        if height < alt_min || height > alt_max || !(r.sd_vvp >= params.vvp_thresh) {
            continue;
        }
        retained += 1;

        let weight = match params.alpha {
            Some(alpha) => params.weighting.weight(r.direction, alpha),
            None => 1.0,
        };

        let contribution = weight * r.speed * r.density * KMH_PER_MS;
        if !contribution.is_nan() {
            total += contribution;
        }
    }

    if retained == 0 {
        return Ok(f64::NAN);
    }

    Ok(0.001 * params.interval * total)
}

/// Bin thickness implied by the data: the smallest positive spacing
/// between distinct heights. `None` with fewer than two distinct heights.
pub fn infer_interval(records: &[ProfileRecord]) -> Option<f64> {
    let mut heights: Vec<i64> = records.iter().map(|r| r.height).collect();
    heights.sort_unstable();
    heights.dedup();

    heights
        .windows(2)
        .map(|w| w[1] - w[0])
        .min()
        .map(|step| step as f64)
}
