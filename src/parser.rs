//! CSV parser for vertical profile time series (VPTS).

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::profile::ProfileRecord;

/// Columns every VPTS file must carry. Other columns are ignored.
pub const REQUIRED_COLUMNS: [&str; 6] = ["datetime", "height", "dd", "ff", "dens", "sd_vvp"];

const NAIVE_DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y%m%dT%H%M"];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("missing required column: {0}")]
    MissingColumn(&'static str),
    #[error("line {line}: row ends before required column {column}")]
    MissingField { line: u64, column: &'static str },
    #[error("line {line}: invalid datetime {value:?}")]
    InvalidDatetime { line: u64, value: String },
    #[error("line {line}: column {column} is not an integer: {value:?}")]
    InvalidInteger {
        line: u64,
        column: &'static str,
        value: String,
    },
    #[error("line {line}: column {column} is not a number: {value:?}")]
    InvalidNumber {
        line: u64,
        column: &'static str,
        value: String,
    },
    #[error("line {line}: malformed row: {message}")]
    MalformedRow { line: u64, message: String },
}

/// Records that parsed cleanly plus the rows that were rejected.
#[derive(Debug, Default)]
pub struct ParsedVpts {
    pub records: Vec<ProfileRecord>,
    pub rejected: Vec<ParseError>,
}

struct ColumnIndex {
    datetime: usize,
    height: usize,
    dd: usize,
    ff: usize,
    dens: usize,
    sd_vvp: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, ParseError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or(ParseError::MissingColumn(name))
        };

        Ok(Self {
            datetime: find("datetime")?,
            height: find("height")?,
            dd: find("dd")?,
            ff: find("ff")?,
            dens: find("dens")?,
            sd_vvp: find("sd_vvp")?,
        })
    }
}

/// Parses a VPTS CSV document.
///
/// A row whose required field fails to parse is rejected on its own and
/// reported in [`ParsedVpts::rejected`]; the remaining rows are kept.
///
/// # Errors
///
/// Returns an error if the header lacks one of [`REQUIRED_COLUMNS`].
pub fn parse_vpts(bytes: &[u8]) -> Result<ParsedVpts, ParseError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = rdr
        .headers()
        .map_err(|e| ParseError::MalformedRow {
            line: 1,
            message: e.to_string(),
        })?
        .clone();
    let columns = ColumnIndex::from_headers(&headers)?;

    let mut parsed = ParsedVpts::default();

    for result in rdr.records() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                let err = ParseError::MalformedRow {
                    line,
                    message: e.to_string(),
                };
                warn!(error = %err, "Rejected VPTS row");
                parsed.rejected.push(err);
                continue;
            }
        };

        let line = row.position().map(|p| p.line()).unwrap_or(0);
        match parse_row(&row, &columns, line) {
            Ok(record) => parsed.records.push(record),
            Err(err) => {
                warn!(error = %err, "Rejected VPTS row");
                parsed.rejected.push(err);
            }
        }
    }

    debug!(
        records = parsed.records.len(),
        rejected = parsed.rejected.len(),
        "VPTS parsed"
    );

    Ok(parsed)
}

fn parse_row(
    row: &csv::StringRecord,
    columns: &ColumnIndex,
    line: u64,
) -> Result<ProfileRecord, ParseError> {
    // A cell that exists but is empty is a missing value; a cell the row
    // never reaches is a truncated row.
    let field = |idx: usize, column: &'static str| {
        row.get(idx)
            .ok_or(ParseError::MissingField { line, column })
    };

    let datetime_text = field(columns.datetime, "datetime")?;
    let timestamp =
        parse_datetime(datetime_text).ok_or_else(|| ParseError::InvalidDatetime {
            line,
            value: datetime_text.to_string(),
        })?;

    Ok(ProfileRecord {
        timestamp,
        height: parse_height(field(columns.height, "height")?, line)?,
        direction: parse_measurement(field(columns.dd, "dd")?, "dd", line)?,
        speed: parse_measurement(field(columns.ff, "ff")?, "ff", line)?,
        density: parse_measurement(field(columns.dens, "dens")?, "dens", line)?,
        sd_vvp: parse_measurement(field(columns.sd_vvp, "sd_vvp")?, "sd_vvp", line)?,
    })
}

/// Parses a timestamp as RFC 3339, a naive UTC date-time, or epoch milliseconds.
pub fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    text.parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
}

/// Parses a bin height. Integral float text such as `"200.0"` is accepted.
pub fn parse_height(text: &str, line: u64) -> Result<i64, ParseError> {
    let text = text.trim();
    let invalid = || ParseError::InvalidInteger {
        line,
        column: "height",
        value: text.to_string(),
    };

    if let Ok(height) = text.parse::<i64>() {
        return Ok(height);
    }

    let value = text.parse::<f64>().map_err(|_| invalid())?;
    if value.is_finite() && value.fract() == 0.0 {
        Ok(value as i64)
    } else {
        Err(invalid())
    }
}

/// Parses a measurement column. `NA`, `NaN` and empty cells become NaN.
pub fn parse_measurement(text: &str, column: &'static str, line: u64) -> Result<f64, ParseError> {
    let text = text.trim();
    if is_missing_token(text) {
        return Ok(f64::NAN);
    }

    text.parse::<f64>()
        .map_err(|_| ParseError::InvalidNumber {
            line,
            column,
            value: text.to_string(),
        })
}

fn is_missing_token(text: &str) -> bool {
    text.is_empty() || text.eq_ignore_ascii_case("na") || text.eq_ignore_ascii_case("nan")
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "radar,datetime,height,u,v,w,ff,dd,sd_vvp,gap,dbz,eta,dens,DBZH,n,n_dbz,n_all,n_dbz_all,rcs,sd_vvp_threshold,vcp,radar_latitude,radar_longitude,radar_height,radar_wavelength";

    #[test]
    fn test_parse_minimal_document() {
        let csv = "datetime,height,dd,ff,dens,sd_vvp\n\
                   2016-09-01T00:02:00Z,200,0,10,5,3\n\
                   2016-09-01T00:02:00Z,400,90,12.5,2.5,1.5\n";
        let parsed = parse_vpts(csv.as_bytes()).unwrap();

        assert!(parsed.rejected.is_empty());
        assert_eq!(parsed.records.len(), 2);
        let first = parsed.records[0];
        assert_eq!(first.height, 200);
        assert_eq!(first.direction, 0.0);
        assert_eq!(first.speed, 10.0);
        assert_eq!(first.density, 5.0);
        assert_eq!(first.sd_vvp, 3.0);
    }

    #[test]
    fn test_parse_ignores_extra_columns_and_order() {
        let csv = format!(
            "{HEADER}\nbejab,2016-09-01T00:02:00Z,200,NA,NA,NA,7.2,191.3,2.9,FALSE,4.1,12,0.7,5,10,10,20,20,11,2,0,51.19,3.06,50,5.3\n"
        );
        let parsed = parse_vpts(csv.as_bytes()).unwrap();

        assert!(parsed.rejected.is_empty());
        let record = parsed.records[0];
        assert_eq!(record.direction, 191.3);
        assert_eq!(record.speed, 7.2);
        assert_eq!(record.density, 0.7);
        assert_eq!(record.sd_vvp, 2.9);
    }

    #[test]
    fn test_parse_missing_column() {
        let csv = "datetime,height,dd,ff,sd_vvp\n2016-09-01T00:02:00Z,200,0,10,3\n";
        let err = parse_vpts(csv.as_bytes()).unwrap_err();
        assert_eq!(err, ParseError::MissingColumn("dens"));
    }

    #[test]
    fn test_parse_rejects_bad_rows_and_keeps_others() {
        let csv = "datetime,height,dd,ff,dens,sd_vvp\n\
                   2016-09-01T00:02:00Z,200,0,10,5,3\n\
                   not-a-date,200,0,10,5,3\n\
                   2016-09-01T00:02:00Z,two hundred,0,10,5,3\n\
                   2016-09-01T00:02:00Z,600,0,fast,5,3\n";
        let parsed = parse_vpts(csv.as_bytes()).unwrap();

        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.rejected.len(), 3);
        assert!(matches!(
            parsed.rejected[0],
            ParseError::InvalidDatetime { line: 3, .. }
        ));
        assert!(matches!(
            parsed.rejected[1],
            ParseError::InvalidInteger { line: 4, column: "height", .. }
        ));
        assert!(matches!(
            parsed.rejected[2],
            ParseError::InvalidNumber { line: 5, column: "ff", .. }
        ));
    }

    #[test]
    fn test_parse_rejects_truncated_rows() {
        let csv = "datetime,height,dd,ff,dens,sd_vvp\n\
                   2016-09-01T00:02:00Z,200,0,10,5,3\n\
                   2016-09-01T00:02:00Z,1800\n\
                   2016-09-01T00:02:00Z,400,0,10,5,\n";
        let parsed = parse_vpts(csv.as_bytes()).unwrap();

        assert_eq!(parsed.records.len(), 2);
        assert_eq!(
            parsed.rejected,
            vec![ParseError::MissingField {
                line: 3,
                column: "dd"
            }]
        );
        // Present but empty cell is a missing value, not a truncated row.
        assert_eq!(parsed.records[1].height, 400);
        assert!(parsed.records[1].sd_vvp.is_nan());
    }

    #[test]
    fn test_missing_tokens_become_nan() {
        assert!(parse_measurement("NA", "ff", 1).unwrap().is_nan());
        assert!(parse_measurement("nan", "ff", 1).unwrap().is_nan());
        assert!(parse_measurement("  ", "ff", 1).unwrap().is_nan());
        assert_eq!(parse_measurement(" 4.5 ", "ff", 1).unwrap(), 4.5);
    }

    #[test]
    fn test_parse_height_variants() {
        assert_eq!(parse_height("200", 1).unwrap(), 200);
        assert_eq!(parse_height("1400.0", 1).unwrap(), 1400);
        assert!(parse_height("200.5", 1).is_err());
        assert!(parse_height("NA", 1).is_err());
    }

    #[test]
    fn test_parse_datetime_formats() {
        let expected = Utc.with_ymd_and_hms(2016, 9, 1, 0, 2, 0).unwrap();

        assert_eq!(parse_datetime("2016-09-01T00:02:00Z"), Some(expected));
        assert_eq!(parse_datetime("2016-09-01 00:02:00"), Some(expected));
        assert_eq!(parse_datetime("20160901T0002"), Some(expected));
        assert_eq!(parse_datetime("1472688120000"), Some(expected));
        assert_eq!(parse_datetime(""), None);
        assert_eq!(parse_datetime("yesterday"), None);
    }
}
