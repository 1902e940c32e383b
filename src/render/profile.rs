use anyhow::Result;
use plotters::prelude::*;

use super::{ChartConfig, format_time, time_bounds};
use crate::profile::ProfileGroup;

/// Column width used when a profile has no neighbour to measure against.
const DEFAULT_STEP_S: f64 = 300.0;

/// Draws the raw profiles as a time/height heatmap of target density.
///
/// Each record becomes a cell spanning its bin (`bin_height` meters) and the
/// time until the next profile. Bins with a missing or zero density are left
/// blank.
pub fn render_profile(config: &ChartConfig, groups: &[ProfileGroup], bin_height: f64) -> Result<String> {
    let columns = time_columns(groups);

    let (x_min, _) = time_bounds(columns.iter().map(|&(t, _, _)| t));
    let (_, x_max) = time_bounds(columns.iter().map(|&(t, w, _)| t + w));
    let y_max = groups
        .iter()
        .flat_map(|g| g.records.iter())
        .map(|r| r.height as f64 + bin_height)
        .fold(bin_height.max(1.0), f64::max);
    let max_density = groups
        .iter()
        .flat_map(|g| g.records.iter())
        .map(|r| r.density)
        .filter(|d| d.is_finite())
        .fold(0.0, f64::max);

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
        let mut chart = builder.build_cartesian_2d(x_min..x_max, 0.0..y_max)?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(5)
            .x_label_formatter(&|v| format_time(*v))
            .y_label_formatter(&|v| format!("{:.0}", v))
            .x_desc("Time (UTC)")
            .y_desc("Height (m)")
            .label_style(("sans-serif", 11))
            .draw()?;

        for &(t, width, group) in &columns {
            chart.draw_series(
                group
                    .records
                    .iter()
                    .filter(|r| r.density.is_finite() && r.density > 0.0)
                    .map(|r| {
                        let y0 = r.height as f64;
                        Rectangle::new(
                            [(t, y0), (t + width, y0 + bin_height)],
                            density_color(r.density, max_density).filled(),
                        )
                    }),
            )?;
        }

        root.present()?;
    }

    Ok(svg)
}

/// `(start, width, group)` per profile in chronological order.
fn time_columns(groups: &[ProfileGroup]) -> Vec<(f64, f64, &ProfileGroup)> {
    let mut sorted: Vec<&ProfileGroup> = groups.iter().collect();
    sorted.sort_by_key(|g| g.timestamp);

    let starts: Vec<f64> = sorted.iter().map(|g| g.timestamp.timestamp() as f64).collect();
    let mut columns = Vec::with_capacity(sorted.len());
    let mut last_step = DEFAULT_STEP_S;

    for (i, group) in sorted.into_iter().enumerate() {
        let width = match starts.get(i + 1) {
            Some(next) => next - starts[i],
            None => last_step,
        };
        last_step = width;
        columns.push((starts[i], width, group));
    }

    columns
}

/// Blue (sparse) to red (dense), on a log scale.
fn density_color(density: f64, max_density: f64) -> HSLColor {
    let frac = if max_density > 0.0 {
        (density.ln_1p() / max_density.ln_1p()).clamp(0.0, 1.0)
    } else {
        0.0
    };
    HSLColor(0.66 * (1.0 - frac), 0.85, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::group_by_timestamp;
    use crate::profile::{ProfileRecord, record};
    use chrono::{Duration, TimeZone, Utc};

    fn at(minutes: i64, height: i64, dens: f64) -> ProfileRecord {
        ProfileRecord {
            timestamp: Utc.with_ymd_and_hms(2016, 9, 1, 0, 0, 0).unwrap()
                + Duration::minutes(minutes),
            ..record(height, 0.0, 10.0, dens, 3.0)
        }
    }

    #[test]
    fn test_time_columns_sorted_with_widths() {
        let groups = group_by_timestamp(vec![at(10, 0, 1.0), at(0, 0, 1.0), at(5, 0, 1.0)]);
        let columns = time_columns(&groups);

        let widths: Vec<f64> = columns.iter().map(|&(_, w, _)| w).collect();
        assert_eq!(widths, vec![300.0, 300.0, 300.0]);
        assert!(columns.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_density_color_extremes() {
        let sparse = density_color(0.0, 10.0);
        let dense = density_color(10.0, 10.0);
        assert!((sparse.0 - 0.66).abs() < 1e-12);
        assert!(dense.0.abs() < 1e-12);
        assert_eq!(density_color(5.0, 0.0).0, 0.66);
    }

    #[test]
    fn test_render_profile_svg() {
        let groups = group_by_timestamp(vec![
            at(0, 0, 1.0),
            at(0, 200, 4.0),
            at(5, 0, f64::NAN),
            at(5, 200, 0.0),
        ]);
        let svg = render_profile(&ChartConfig::default().with_height(300), &groups, 200.0).unwrap();

        assert!(svg.contains("<svg"));
        assert!(svg.contains("height=\"300\""));
        assert!(svg.contains("Height (m)"));
    }

    #[test]
    fn test_render_profile_empty() {
        let svg = render_profile(&ChartConfig::default(), &[], 200.0).unwrap();
        assert!(svg.contains("<svg"));
    }
}
