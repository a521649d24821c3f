//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use rangeget_core::{
    CONNECT_TIMEOUT_SECS, DEFAULT_RETRY_BUDGET, DEFAULT_WORKERS, DownloadConfig, READ_TIMEOUT_SECS,
};

/// Fetch a file over HTTP using parallel byte-range workers.
///
/// When the server advertises range support and a content length, the body
/// is split across workers; otherwise it is read sequentially. An MD5 digest
/// advertised via ETag or X-Goog-Hash is verified before the file is written.
#[derive(Parser, Debug)]
#[command(name = "rangeget")]
#[command(author, version, about)]
pub struct Args {
    /// URL of the resource to download
    pub url: String,

    /// Destination path (defaults to the last URL path segment)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of parallel range workers (1-64; 1 forces a sequential transfer)
    #[arg(short = 'w', long, default_value_t = DEFAULT_WORKERS as u8, value_parser = clap::value_parser!(u8).range(1..=64))]
    pub workers: u8,

    /// Chunk failures tolerated across the whole download before aborting
    #[arg(short = 'r', long, default_value_t = DEFAULT_RETRY_BUDGET, value_parser = clap::value_parser!(u32).range(0..=1000))]
    pub max_retries: u32,

    /// HTTP connect timeout in seconds
    #[arg(long, default_value_t = CONNECT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: u64,

    /// Seconds without receiving data before a request is abandoned
    #[arg(long, default_value_t = READ_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=86400))]
    pub read_timeout: u64,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Engine configuration described by these arguments.
    #[must_use]
    pub fn download_config(&self) -> DownloadConfig {
        DownloadConfig::default()
            .with_workers(usize::from(self.workers))
            .with_retry_budget(self.max_retries)
            .with_timeouts(self.connect_timeout, self.read_timeout)
    }

    /// Default log level when `RUST_LOG` is not set.
    #[must_use]
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }
}
