use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;
use vpts_mtr::fetch::load_source;
use vpts_mtr::mtr::MtrParams;
use vpts_mtr::output::write_csv;
use vpts_mtr::pipeline::{PipelineOptions, run, summarize};
use vpts_mtr::render::{ChartConfig, Report, render_report};

const FIXTURE: &[u8] = include_bytes!("fixtures/example_vpts.csv");

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn test_full_pipeline() {
    let output = run(FIXTURE, &PipelineOptions::default()).expect("Failed to run pipeline");

    // Last row has a malformed height.
    assert_eq!(output.rejected.len(), 1);
    assert_eq!(output.series.len(), 4);

    assert_close(output.series[0].mtr, 586.313856);
    assert_close(output.series[1].mtr, 526.401504);
    // Every bin of the third profile is below the sd_vvp threshold.
    assert!(output.series[2].is_missing());
    assert_close(output.series[3].mtr, 641.35764);
}

#[test]
fn test_pipeline_with_altitude_window() {
    let options = PipelineOptions {
        params: MtrParams {
            alt_min: 200.0,
            alt_max: 600.0,
            ..Default::default()
        },
        ..Default::default()
    };
    let output = run(FIXTURE, &options).unwrap();

    assert_close(output.series[0].mtr, 317.795256);
    assert_close(output.series[1].mtr, 284.827104);
    assert_close(output.series[3].mtr, 226.75824);
}

#[test]
fn test_pipeline_with_direction_weighting() {
    let options = PipelineOptions {
        params: MtrParams {
            alpha: Some(200.0),
            ..Default::default()
        },
        ..Default::default()
    };
    let output = run(FIXTURE, &options).unwrap();

    assert_close(output.series[0].mtr, 502.4366428511904);
    assert_close(output.series[3].mtr, 629.9601833495944);
}

#[test]
fn test_strict_pipeline_fails_on_bad_row() {
    let options = PipelineOptions {
        strict: true,
        ..Default::default()
    };
    assert!(run(FIXTURE, &options).is_err());
}

#[test]
fn test_summary_of_fixture() {
    let summary = summarize(FIXTURE).unwrap();

    assert_eq!(summary.records, 24);
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.profiles, 4);
    assert_eq!(summary.min_height, Some(0));
    assert_eq!(summary.max_height, Some(1000));
    assert_eq!(summary.inferred_interval, Some(200.0));
    assert_eq!(summary.missing_density, 4);
}

#[test]
fn test_csv_output_of_fixture() {
    let output = run(FIXTURE, &PipelineOptions::default()).unwrap();
    let mut buf = Vec::new();
    write_csv(&mut buf, &output.series).unwrap();

    let content = String::from_utf8(buf).unwrap();
    let lines: Vec<_> = content.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[3], "2016-09-01T00:10:00Z,");
}

#[test]
fn test_report_of_fixture() {
    let output = run(FIXTURE, &PipelineOptions::default()).unwrap();
    let html = render_report(
        &Report {
            source: "example_vpts.csv",
            params: &output.params,
            series: &output.series,
            groups: &output.groups,
        },
        &ChartConfig::default().with_width(900).with_height(320),
    )
    .unwrap();

    assert!(html.contains("id=\"mtr-chart\""));
    assert!(html.contains("id=\"profile-chart\""));
    assert!(html.contains("Profiles: 4 (1 without data, 75.0% coverage)"));
}

#[tokio::test]
async fn test_load_gzipped_source() {
    let path = std::env::temp_dir().join("vpts_mtr_it_example_vpts.csv.gz");
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(FIXTURE).unwrap();
    std::fs::write(&path, encoder.finish().unwrap()).unwrap();

    let bytes = load_source(path.to_str().unwrap()).await.unwrap();
    assert_eq!(bytes, FIXTURE);

    std::fs::remove_file(&path).unwrap();
}
