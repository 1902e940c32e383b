//! Standalone HTML report with the MTR and profile charts.

use std::fmt::Write;

use anyhow::Result;

use super::{ChartConfig, render_profile, render_time_series};
use crate::mtr::MtrParams;
use crate::profile::{MtrResult, ProfileGroup};
use crate::stats::SeriesStats;

/// Everything shown on the report page.
pub struct Report<'a> {
    pub source: &'a str,
    pub params: &'a MtrParams,
    pub series: &'a [MtrResult],
    pub groups: &'a [ProfileGroup],
}

/// Renders both charts and wraps them in an HTML document.
pub fn render_report(report: &Report<'_>, chart: &ChartConfig) -> Result<String> {
    let mtr_svg = render_time_series(
        &chart.clone().with_title("Migration traffic rate"),
        report.series,
    )?;
    let profile_svg = render_profile(
        &chart.clone().with_title("Target density"),
        report.groups,
        report.params.interval,
    )?;
    let stats = SeriesStats::from_series(report.series);

    let mut html = String::new();
    writeln!(html, "<!DOCTYPE html>")?;
    writeln!(html, "<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">")?;
    writeln!(html, "<title>MTR – {}</title>", escape(report.source))?;
    writeln!(
        html,
        "<style>body{{font-family:sans-serif;margin:2em;color:#222}}\
         figure{{margin:1em 0}}table{{border-collapse:collapse}}\
         td,th{{padding:2px 10px;text-align:right;border-bottom:1px solid #ddd}}</style>"
    )?;
    writeln!(html, "</head>\n<body>")?;
    writeln!(html, "<h1>Migration traffic rate</h1>")?;
    writeln!(html, "<p>Source: <code>{}</code></p>", escape(report.source))?;

    writeln!(html, "<ul>")?;
    writeln!(
        html,
        "<li>Altitude window: {} – {} m, bin {} m</li>",
        report.params.alt_min,
        format_bound(report.params.alt_max),
        report.params.interval
    )?;
    writeln!(html, "<li>sd_vvp threshold: {}</li>", report.params.vvp_thresh)?;
    match report.params.alpha {
        Some(alpha) => writeln!(
            html,
            "<li>Direction weighting: {alpha}° ({:?})</li>",
            report.params.weighting
        )?,
        None => writeln!(html, "<li>Direction weighting: none</li>")?,
    }
    writeln!(
        html,
        "<li>Profiles: {} ({} without data, {:.1}% coverage)</li>",
        stats.points,
        stats.missing,
        stats.coverage_pct()
    )?;
    writeln!(
        html,
        "<li>Mean MTR: {:.2} birds/km/h, peak {:.2}{}</li>",
        stats.mean_mtr,
        stats.max_mtr,
        stats
            .peak_at
            .map(|t| format!(" at {}", t.format("%Y-%m-%d %H:%M UTC")))
            .unwrap_or_default()
    )?;
    writeln!(html, "</ul>")?;

    writeln!(html, "<figure id=\"mtr-chart\">\n{mtr_svg}\n</figure>")?;
    writeln!(html, "<figure id=\"profile-chart\">\n{profile_svg}\n</figure>")?;

    writeln!(html, "<details>\n<summary>MTR values</summary>")?;
    writeln!(html, "<table>\n<tr><th>datetime</th><th>mtr</th></tr>")?;
    for r in report.series {
        let mtr = if r.is_missing() {
            "–".to_string()
        } else {
            format!("{:.3}", r.mtr)
        };
        writeln!(
            html,
            "<tr><td>{}</td><td>{}</td></tr>",
            r.datetime.format("%Y-%m-%dT%H:%M:%SZ"),
            mtr
        )?;
    }
    writeln!(html, "</table>\n</details>")?;
    writeln!(html, "</body>\n</html>")?;

    Ok(html)
}

fn format_bound(value: f64) -> String {
    if value.is_infinite() {
        "∞".to_string()
    } else {
        value.to_string()
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::group_by_timestamp;
    use crate::profile::record;

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }

    #[test]
    fn test_render_report_contains_both_charts() {
        let records = vec![record(200, 0.0, 10.0, 5.0, 3.0), record(400, 0.0, 10.0, 5.0, 1.0)];
        let groups = group_by_timestamp(records);
        let series = vec![MtrResult {
            datetime: groups[0].timestamp,
            mtr: 36.0,
        }];
        let params = MtrParams::default();

        let html = render_report(
            &Report {
                source: "data/<vpts>.csv",
                params: &params,
                series: &series,
                groups: &groups,
            },
            &ChartConfig::default(),
        )
        .unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("id=\"mtr-chart\""));
        assert!(html.contains("id=\"profile-chart\""));
        assert!(html.contains("data/&lt;vpts&gt;.csv"));
        assert!(html.contains("0 – ∞ m, bin 200 m"));
        assert!(html.contains("<td>2016-09-01T00:00:00Z</td><td>36.000</td>"));
        assert!(html.contains("Direction weighting: none"));
    }
}
