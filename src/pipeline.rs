//! Parse → group → aggregate over one VPTS document.

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::group::group_by_timestamp;
use crate::mtr::{MtrParams, compute_mtr, infer_interval};
use crate::parser::{ParseError, parse_vpts};
use crate::profile::{MtrResult, ProfileGroup, height_range};

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub params: MtrParams,
    /// Derive the bin thickness from the data instead of `params.interval`.
    pub infer_interval: bool,
    /// Fail the run when any row is rejected.
    pub strict: bool,
}

/// Result of a pipeline run.
#[derive(Debug)]
pub struct PipelineOutput {
    /// Parameters actually used, after interval inference.
    pub params: MtrParams,
    pub groups: Vec<ProfileGroup>,
    pub series: Vec<MtrResult>,
    pub rejected: Vec<ParseError>,
}

/// Parses `bytes`, groups by timestamp and computes one MTR per profile.
///
/// # Errors
///
/// Fails on a missing required column, invalid MTR parameters, or, with
/// `strict`, any rejected row.
#[tracing::instrument(skip(bytes), fields(bytes = bytes.len()))]
pub fn run(bytes: &[u8], options: &PipelineOptions) -> Result<PipelineOutput> {
    let mut params = options.params;
    params.validate()?;

    let parsed = parse_vpts(bytes)?;
    if options.strict {
        if let Some(first) = parsed.rejected.first() {
            bail!(
                "{} row(s) rejected in strict mode, first: {}",
                parsed.rejected.len(),
                first
            );
        }
    }

    if options.infer_interval {
        match infer_interval(&parsed.records) {
            Some(interval) => {
                debug!(interval, "Inferred bin interval from data");
                params.interval = interval;
            }
            None => debug!(
                interval = params.interval,
                "Too few distinct heights to infer interval, keeping configured value"
            ),
        }
    }

    let groups = group_by_timestamp(parsed.records);
    let series = groups
        .iter()
        .map(|g| -> Result<MtrResult> {
            Ok(MtrResult {
                datetime: g.timestamp,
                mtr: compute_mtr(&g.records, &params)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    info!(
        profiles = groups.len(),
        missing = series.iter().filter(|r| r.is_missing()).count(),
        rejected = parsed.rejected.len(),
        "MTR series computed"
    );

    Ok(PipelineOutput {
        params,
        groups,
        series,
        rejected: parsed.rejected,
    })
}

/// Overview of a VPTS document, without aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub records: usize,
    pub rejected: usize,
    pub profiles: usize,
    pub first: Option<DateTime<Utc>>,
    pub last: Option<DateTime<Utc>>,
    pub min_height: Option<i64>,
    pub max_height: Option<i64>,
    pub inferred_interval: Option<f64>,
    /// Records whose density is missing.
    pub missing_density: usize,
}

/// Parses `bytes` and summarises what it holds.
pub fn summarize(bytes: &[u8]) -> Result<DatasetSummary> {
    let parsed = parse_vpts(bytes)?;
    let range = height_range(&parsed.records);
    let inferred_interval = infer_interval(&parsed.records);
    let missing_density = parsed.records.iter().filter(|r| r.density.is_nan()).count();
    let records = parsed.records.len();
    let groups = group_by_timestamp(parsed.records);

    Ok(DatasetSummary {
        records,
        rejected: parsed.rejected.len(),
        profiles: groups.len(),
        first: groups.iter().map(|g| g.timestamp).min(),
        last: groups.iter().map(|g| g.timestamp).max(),
        min_height: range.map(|(lo, _)| lo),
        max_height: range.map(|(_, hi)| hi),
        inferred_interval,
        missing_density,
    })
}
