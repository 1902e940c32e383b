//! CLI entry point for the VPTS migration traffic rate tool.
//!
//! Provides subcommands for computing the MTR series of a VPTS CSV file,
//! rendering it as an HTML report, and inspecting a file's contents.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use vpts_mtr::{
    config::RunConfig,
    fetch::load_source,
    mtr::{DirectionWeighting, check_interval, parse_argument},
    output::{print_json, print_pretty, write_series, write_text},
    pipeline::{self, PipelineOptions},
    render::{ChartConfig, Report, render_report},
    stats::SeriesStats,
};

/// Environment variable naming a default run configuration file.
const CONFIG_ENV: &str = "VPTS_MTR_CONFIG";

#[derive(Parser)]
#[command(name = "vpts_mtr")]
#[command(about = "Migration traffic rates from bird-radar vertical profile time series", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the MTR series of a VPTS CSV file
    Mtr {
        /// Path or URL of the VPTS CSV (optionally gzip-compressed)
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// File to write the series to (`-` for stdout)
        #[arg(short, long, default_value = "-")]
        output: String,

        /// Write JSON instead of CSV
        #[arg(long, default_value_t = false)]
        json: bool,

        #[command(flatten)]
        mtr: MtrArgs,
    },
    /// Compute the MTR series and write an HTML report with charts
    Render {
        /// Path or URL of the VPTS CSV (optionally gzip-compressed)
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// HTML file to write
        #[arg(short, long, default_value = "mtr.html")]
        output: String,

        /// Chart width in pixels
        #[arg(long)]
        width: Option<u32>,

        /// Chart height in pixels
        #[arg(long)]
        height: Option<u32>,

        #[command(flatten)]
        mtr: MtrArgs,
    },
    /// Summarise the records of a VPTS CSV file
    Inspect {
        /// Path or URL of the VPTS CSV (optionally gzip-compressed)
        #[arg(value_name = "FILE_OR_URL")]
        source: String,
    },
}

#[derive(Args, Debug)]
struct MtrArgs {
    /// JSON run configuration; the flags below override its values
    #[arg(short, long)]
    config: Option<String>,

    /// Lower altitude bound in meters [default: 0]
    #[arg(long, allow_hyphen_values = true)]
    alt_min: Option<String>,

    /// Upper altitude bound in meters, `inf` for none [default: inf]
    #[arg(long, allow_hyphen_values = true)]
    alt_max: Option<String>,

    /// Altitude bin thickness in meters [default: 200]
    #[arg(long)]
    interval: Option<String>,

    /// Derive the bin thickness from the data's height spacing
    #[arg(long, default_value_t = false)]
    infer_interval: bool,

    /// Minimum sd_vvp for a bin to count [default: 2]
    #[arg(long, allow_hyphen_values = true)]
    vvp_thresh: Option<String>,

    /// Direction of interest in degrees; enables directional weighting
    #[arg(long, allow_hyphen_values = true)]
    alpha: Option<String>,

    /// How bearings are projected onto alpha
    #[arg(long, value_enum)]
    weighting: Option<WeightingOpt>,

    /// Fail when any CSV row cannot be parsed
    #[arg(long, default_value_t = false)]
    strict: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum WeightingOpt {
    Radians,
    Legacy,
}

impl From<WeightingOpt> for DirectionWeighting {
    fn from(opt: WeightingOpt) -> Self {
        match opt {
            WeightingOpt::Radians => DirectionWeighting::Radians,
            WeightingOpt::Legacy => DirectionWeighting::Legacy,
        }
    }
}

impl MtrArgs {
    /// Layers the flags over the config file over the defaults.
    fn resolve(&self) -> Result<(PipelineOptions, RunConfig)> {
        let config_path = self.config.clone().or_else(|| std::env::var(CONFIG_ENV).ok());
        let config = match config_path {
            Some(path) => RunConfig::load(&path)?,
            None => RunConfig::default(),
        };

        let mut params = config.mtr_params()?;
        if let Some(text) = &self.alt_min {
            params.alt_min = parse_argument("alt_min", text)?;
        }
        if let Some(text) = &self.alt_max {
            params.alt_max = parse_argument("alt_max", text)?;
        }
        if let Some(text) = &self.interval {
            params.interval = check_interval(parse_argument("interval", text)?)?;
        }
        if let Some(text) = &self.vvp_thresh {
            params.vvp_thresh = parse_argument("vvp_thresh", text)?;
        }
        if let Some(text) = &self.alpha {
            params.alpha = Some(parse_argument("alpha", text)?);
        }
        if let Some(weighting) = self.weighting {
            params.weighting = weighting.into();
        }

        let options = PipelineOptions {
            params,
            infer_interval: self.infer_interval,
            strict: self.strict,
        };
        Ok((options, config))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/vpts_mtr.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("vpts_mtr.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Mtr {
            source,
            output,
            json,
            mtr,
        } => {
            let (options, _) = mtr.resolve()?;
            let bytes = load_source(&source).await?;
            let result = pipeline::run(&bytes, &options)
                .with_context(|| format!("failed to process {source}"))?;

            write_series(&output, &result.series, json)?;

            let stats = SeriesStats::from_series(&result.series);
            print_pretty(&stats);
            info!(
                points = stats.points,
                missing = stats.missing,
                mean_mtr = stats.mean_mtr,
                max_mtr = stats.max_mtr,
                output = %output,
                "MTR series written"
            );
        }
        Commands::Render {
            source,
            output,
            width,
            height,
            mtr,
        } => {
            let (options, config) = mtr.resolve()?;
            let bytes = load_source(&source).await?;
            let result = pipeline::run(&bytes, &options)
                .with_context(|| format!("failed to process {source}"))?;

            let mut chart = config.chart(ChartConfig::default().with_width(900).with_height(320));
            if let Some(w) = width {
                chart = chart.with_width(w);
            }
            if let Some(h) = height {
                chart = chart.with_height(h);
            }

            let html = render_report(
                &Report {
                    source: &source,
                    params: &result.params,
                    series: &result.series,
                    groups: &result.groups,
                },
                &chart,
            )?;
            write_text(&output, &html)?;

            print_json(&SeriesStats::from_series(&result.series))?;
            info!(output = %output, "Report written");
        }
        Commands::Inspect { source } => {
            let bytes = load_source(&source).await?;
            let summary = pipeline::summarize(&bytes)
                .with_context(|| format!("failed to parse {source}"))?;

            info!(
                records = summary.records,
                rejected = summary.rejected,
                profiles = summary.profiles,
                first = ?summary.first,
                last = ?summary.last,
                min_height = ?summary.min_height,
                max_height = ?summary.max_height,
                inferred_interval = ?summary.inferred_interval,
                missing_density = summary.missing_density,
                "VPTS summary"
            );
        }
    }

    Ok(())
}
