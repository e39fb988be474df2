//! Wildfire risk scan
//!
//! Runs one assessment for a bounding box and prints the response as JSON.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use assessment::{AssessmentPipeline, AssessmentRequest, PipelineConfig};
use chrono::{DateTime, Utc};
use clap::Parser;
use risk_common::BoundingBox;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Wildfire risk scan
#[derive(Parser, Debug)]
#[command(name = "risk-scan")]
#[command(about = "Score wildfire risk for a bounding box from satellite imagery and weather")]
struct Args {
    /// Bounding box as minLon,minLat,maxLon,maxLat
    #[arg(value_parser = BoundingBox::parse, allow_hyphen_values = true)]
    bbox: BoundingBox,

    /// Pipeline configuration file (YAML)
    #[arg(short, long, env = "FIRE_RISK_CONFIG")]
    config: Option<PathBuf>,

    /// Maximum scene cloud cover in percent
    #[arg(long)]
    max_cloud: Option<f64>,

    /// Days to search back from the end date
    #[arg(long)]
    lookback_days: Option<u32>,

    /// End of the search window (RFC 3339); defaults to now
    #[arg(long)]
    end_date: Option<DateTime<Utc>>,

    /// Always attach the NDVI preview
    #[arg(long, conflicts_with = "no_preview")]
    preview: bool,

    /// Never attach the NDVI preview
    #[arg(long)]
    no_preview: bool,

    /// Pretty-print the JSON response
    #[arg(long)]
    pretty: bool,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,
}

impl Args {
    fn request(&self) -> AssessmentRequest {
        let mut request = AssessmentRequest::new(self.bbox);
        request.max_cloud_pct = self.max_cloud;
        request.lookback_days = self.lookback_days;
        request.end_date = self.end_date;
        request.include_preview = match (self.preview, self.no_preview) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        request
    }
}

fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to create Tokio runtime");
            return ExitCode::from(2);
        }
    };

    match runtime.block_on(run(args)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!(error = %format!("{:#}", e), "Risk scan failed");
            ExitCode::from(2)
        }
    }
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    // stdout carries the response
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .json()
        .init();
}

/// Returns whether the response carries an assessment.
async fn run(args: Args) -> anyhow::Result<bool> {
    let config = PipelineConfig::load(args.config.as_deref()).context("loading configuration")?;
    let pipeline =
        AssessmentPipeline::from_config(config).context("initialising assessment pipeline")?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling assessment");
            on_signal.cancel();
        }
    });

    info!(bbox = %args.bbox, "Starting risk scan");
    let response = pipeline.run(args.request(), cancel).await;

    let json = if args.pretty {
        serde_json::to_string_pretty(&response)
    } else {
        serde_json::to_string(&response)
    }
    .context("serialising response")?;
    println!("{}", json);

    Ok(response.is_success())
}
