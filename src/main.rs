//! CLI entry point for the rangeget tool.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rangeget_core::{DownloadEngine, default_output_name};
use tracing::{debug, info};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.default_log_level()));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    let destination = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(default_output_name(&args.url)));

    let engine = DownloadEngine::new(args.download_config())?;

    info!(
        url = %args.url,
        destination = %destination.display(),
        workers = engine.config().workers,
        "downloading"
    );

    let outcome = engine.download_to_path(&args.url, &destination).await?;

    info!(
        bytes = outcome.len(),
        mode = ?outcome.mode(),
        retries = outcome.retries(),
        verification = ?outcome.verification(),
        "success"
    );

    Ok(())
}
