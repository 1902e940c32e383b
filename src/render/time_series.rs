use anyhow::Result;
use plotters::prelude::*;

use super::{ChartConfig, format_time, time_bounds};
use crate::profile::MtrResult;

const SERIES_COLOR: RGBColor = RGBColor(200, 0, 100);

/// Draws the MTR time series. Missing (NaN) points break the line.
pub fn render_time_series(config: &ChartConfig, series: &[MtrResult]) -> Result<String> {
    let segments = finite_segments(series);
    let points: Vec<(f64, f64)> = segments.iter().flatten().copied().collect();

    let (x_min, x_max) = time_bounds(series.iter().map(|r| r.datetime.timestamp() as f64));
    let (y_min, y_max) = value_bounds(points.iter().map(|&(_, y)| y));

    let mut svg = String::new();
    {
        let root =
            SVGBackend::with_string(&mut svg, (config.width(), config.height())).into_drawing_area();
        root.fill(&WHITE)?;

        let mut builder = ChartBuilder::on(&root);
        builder
            .margin(10)
            .set_label_area_size(LabelAreaPosition::Left, 55)
            .set_label_area_size(LabelAreaPosition::Bottom, 40);
        if !config.title().is_empty() {
            builder.caption(config.title(), ("sans-serif", 16));
        }
        let mut chart = builder.build_cartesian_2d(x_min..x_max, y_min..y_max)?;

        chart
            .configure_mesh()
            .x_labels(5)
            .x_label_formatter(&|v| format_time(*v))
            .y_label_formatter(&|v| format!("{:.0}", v))
            .x_desc("Time (UTC)")
            .y_desc("MTR (birds/km/h)")
            .label_style(("sans-serif", 11))
            .draw()?;

        for segment in &segments {
            chart.draw_series(LineSeries::new(segment.iter().copied(), &SERIES_COLOR))?;
        }
        chart.draw_series(
            points
                .iter()
                .map(|&p| Circle::new(p, 2, SERIES_COLOR.filled())),
        )?;

        root.present()?;
    }

    Ok(svg)
}

/// Runs of consecutive finite points as `(epoch seconds, mtr)`.
fn finite_segments(series: &[MtrResult]) -> Vec<Vec<(f64, f64)>> {
    let mut segments = Vec::new();
    let mut current = Vec::new();

    for r in series {
        if r.mtr.is_finite() {
            current.push((r.datetime.timestamp() as f64, r.mtr));
        } else if !current.is_empty() {
            segments.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }

    segments
}

/// Y range spanning zero and every value, with headroom.
fn value_bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((0.0_f64, 1.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    (lo * 1.1, hi * 1.1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn series(values: &[f64]) -> Vec<MtrResult> {
        let start = Utc.with_ymd_and_hms(2016, 9, 1, 0, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &mtr)| MtrResult {
                datetime: start + Duration::minutes(5 * i as i64),
                mtr,
            })
            .collect()
    }

    #[test]
    fn test_segments_split_at_nan() {
        let segments = finite_segments(&series(&[1.0, 2.0, f64::NAN, f64::NAN, 3.0, f64::NAN]));
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].len(), 2);
        assert_eq!(segments[1].len(), 1);
        assert_eq!(segments[1][0].1, 3.0);
    }

    #[test]
    fn test_value_bounds_include_negative() {
        assert_eq!(value_bounds(std::iter::empty()), (0.0, 1.1));
        let (lo, hi) = value_bounds([-10.0, 50.0].into_iter());
        assert!(lo < -10.0);
        assert!(hi > 50.0);
    }

    #[test]
    fn test_render_time_series_svg() {
        let config = ChartConfig::default().with_title("Migration traffic rate");
        let svg = render_time_series(&config, &series(&[18.8, 11.8, f64::NAN, 19.9])).unwrap();

        assert!(svg.contains("<svg"));
        assert!(svg.contains("width=\"500\""));
        assert!(svg.contains("Migration traffic rate"));
        assert!(svg.contains("<circle"));
    }

    #[test]
    fn test_render_time_series_all_missing() {
        let svg = render_time_series(&ChartConfig::default(), &series(&[f64::NAN])).unwrap();
        assert!(svg.contains("<svg"));
        assert!(!svg.contains("<circle"));
    }
}
