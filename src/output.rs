//! Output formatting and persistence for MTR series.
//!
//! Supports pretty-printing, JSON serialization, and CSV files.

use std::fs::File;
use std::io::Write;

use anyhow::{Context, Result};
use csv::WriterBuilder;
use tracing::{debug, info};

use crate::profile::MtrResult;
use crate::stats::SeriesStats;

/// Path meaning "write to stdout".
pub const STDOUT: &str = "-";

/// Logs the series summary using Rust's debug pretty-print format.
pub fn print_pretty(stats: &SeriesStats) {
    debug!("{:#?}", stats);
}

/// Logs the series summary as pretty-printed JSON.
pub fn print_json(stats: &SeriesStats) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(stats)?);
    Ok(())
}

/// Writes the series as `datetime,mtr` CSV. Missing values are empty cells.
pub fn write_csv<W: Write>(writer: W, series: &[MtrResult]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);

    for result in series {
        writer.serialize(result)?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes the series as a JSON array. Missing values are `null`.
pub fn write_json<W: Write>(mut writer: W, series: &[MtrResult]) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, series)?;
    writeln!(writer)?;
    Ok(())
}

/// Writes `series` to `path` (or stdout for `-`), as JSON when `json` is set.
pub fn write_series(path: &str, series: &[MtrResult], json: bool) -> Result<()> {
    debug!(path, points = series.len(), json, "Writing MTR series");

    if path == STDOUT {
        let stdout = std::io::stdout().lock();
        return if json {
            write_json(stdout, series)
        } else {
            write_csv(stdout, series)
        };
    }

    let file = File::create(path).with_context(|| format!("failed to create {path}"))?;
    if json {
        write_json(file, series)
    } else {
        write_csv(file, series)
    }
}

/// Writes a text document (the HTML report) to `path`, creating parent directories.
pub fn write_text(path: &str, content: &str) -> Result<()> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    std::fs::write(path, content).with_context(|| format!("failed to write {path}"))?;
    Ok(())
}
