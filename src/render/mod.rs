//! Chart rendering of MTR series and raw profiles.
//!
//! Rendering is pure: each function takes an immutable [`ChartConfig`] and the
//! data, and returns an SVG document as a string. [`page`] assembles the
//! charts into a standalone HTML report.

pub mod page;
mod profile;
mod time_series;

pub use page::{Report, render_report};
pub use profile::render_profile;
pub use time_series::render_time_series;

use chrono::DateTime;

/// Size and title of one chart.
///
/// Setters consume the value and return a new configuration, so a shared
/// base config can be specialised per chart without mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartConfig {
    width: u32,
    height: u32,
    title: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 500,
            height: 250,
            title: String::new(),
        }
    }
}

impl ChartConfig {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = width.max(1);
        self
    }

    pub fn with_height(mut self, height: u32) -> Self {
        self.height = height.max(1);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Padding applied around a single-instant time axis, seconds.
const MIN_TIME_SPAN_S: f64 = 1800.0;

/// Epoch-second bounds of the x axis, never empty.
fn time_bounds(times: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = times.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), t| {
        (lo.min(t), hi.max(t))
    });
    if !lo.is_finite() {
        return (0.0, MIN_TIME_SPAN_S);
    }
    if hi - lo < 1.0 {
        return (lo - MIN_TIME_SPAN_S / 2.0, hi + MIN_TIME_SPAN_S / 2.0);
    }
    (lo, hi)
}

fn format_time(epoch_s: f64) -> String {
    DateTime::from_timestamp(epoch_s.round() as i64, 0)
        .map(|dt| dt.format("%m-%d %H:%M").to_string())
        .unwrap_or_default()
}
