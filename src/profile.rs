//! Data types shared by the parsing, aggregation and rendering stages.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// One altitude bin of a vertical profile at one timestamp.
///
/// Measurement fields may be NaN when the source marks the value as missing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfileRecord {
    #[serde(rename = "datetime")]
    pub timestamp: DateTime<Utc>,
    /// Lower edge of the bin, meters.
    pub height: i64,
    /// Ground-speed bearing, degrees.
    #[serde(rename = "dd")]
    pub direction: f64,
    /// Ground speed, m/s.
    #[serde(rename = "ff")]
    pub speed: f64,
    /// Target density, birds/km^3.
    #[serde(rename = "dens")]
    pub density: f64,
    pub sd_vvp: f64,
}

/// All records sharing one timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileGroup {
    pub timestamp: DateTime<Utc>,
    pub records: Vec<ProfileRecord>,
}

impl ProfileGroup {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            records: Vec::new(),
        }
    }

    /// Lowest and highest bin height in the group, or `None` when empty.
    pub fn height_range(&self) -> Option<(i64, i64)> {
        height_range(&self.records)
    }
}

/// Lowest and highest height across `records`.
pub fn height_range(records: &[ProfileRecord]) -> Option<(i64, i64)> {
    records.iter().fold(None, |acc, r| match acc {
        None => Some((r.height, r.height)),
        Some((lo, hi)) => Some((lo.min(r.height), hi.max(r.height))),
    })
}

/// Migration traffic rate for one timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MtrResult {
    pub datetime: DateTime<Utc>,
    /// birds/km/h; NaN when no bin survived filtering.
    #[serde(serialize_with = "nan_as_missing")]
    pub mtr: f64,
}

impl MtrResult {
    pub fn is_missing(&self) -> bool {
        self.mtr.is_nan()
    }
}

// Empty CSV cell / JSON null instead of the literal "NaN".
fn nan_as_missing<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_nan() {
        serializer.serialize_none()
    } else {
        serializer.serialize_some(value)
    }
}

#[cfg(test)]
pub(crate) fn record(height: i64, dd: f64, ff: f64, dens: f64, sd_vvp: f64) -> ProfileRecord {
    use chrono::TimeZone;

    ProfileRecord {
        timestamp: Utc.with_ymd_and_hms(2016, 9, 1, 0, 0, 0).unwrap(),
        height,
        direction: dd,
        speed: ff,
        density: dens,
        sd_vvp,
    }
}
