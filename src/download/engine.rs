//! Download engine choosing between parallel and sequential transfers.
//!
//! This module provides the `DownloadEngine` which probes a resource with
//! one GET, decides from the response headers whether the body can be
//! fetched in parallel byte ranges, runs the transfer, and verifies the
//! assembled content before handing it to the caller.
//!
//! # Overview
//!
//! ```text
//! GET url ──► TransferHeaders ──► DownloadTarget
//!                                   │
//!           ranges + length + W>1 ──┼──► coordinator::transfer (parallel)
//!           otherwise ──────────────┴──► read_body (sequential)
//!                                   │
//!                                   ▼
//!                              verify_digest ──► DownloadOutcome
//! ```
//!
//! # Example
//!
//! ```no_run
//! use rangeget_core::download::{DownloadConfig, DownloadEngine};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = DownloadEngine::new(DownloadConfig::default().with_workers(8))?;
//! let outcome = engine
//!     .download_to_path("https://example.com/video.mp4", Path::new("video.mp4"))
//!     .await?;
//! println!("{} bytes, {} retries", outcome.len(), outcome.retries());
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Instant;

use bytes::Bytes;
use tracing::{debug, info, instrument};

use super::client::{HttpClient, read_body};
use super::constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_RETRY_BUDGET, DEFAULT_WORKERS, MAX_WORKERS, MIN_WORKERS,
    READ_TIMEOUT_SECS,
};
use super::coordinator;
use super::error::DownloadError;
use super::header::TransferHeaders;
use super::persist::persist_buffer;
use super::target::DownloadTarget;
use super::verify::{Verification, verify_digest};

/// Error type for download engine configuration.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid worker count provided.
    #[error("invalid worker count {value}: must be between {MIN_WORKERS} and {MAX_WORKERS}")]
    InvalidWorkerCount {
        /// The invalid value that was provided.
        value: usize,
    },

    /// A timeout of zero seconds was provided.
    #[error("invalid {name} timeout: must be at least 1 second")]
    InvalidTimeout {
        /// Which timeout was invalid.
        name: &'static str,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Tunables for one engine.
///
/// # Default Values
///
/// - `workers`: 4
/// - `retry_budget`: 8
/// - `connect_timeout_secs`: 30
/// - `read_timeout_secs`: 300
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadConfig {
    /// Number of parallel range workers (1-64). One forces a sequential transfer.
    pub workers: usize,
    /// Chunk failures the whole download may absorb.
    pub retry_budget: u32,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Longest silence between reads, in seconds; a stalled chunk fails after this long.
    pub read_timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            retry_budget: DEFAULT_RETRY_BUDGET,
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
        }
    }
}

impl DownloadConfig {
    /// Returns the config with a different worker count.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Returns the config with a different retry budget.
    #[must_use]
    pub fn with_retry_budget(mut self, retry_budget: u32) -> Self {
        self.retry_budget = retry_budget;
        self
    }

    /// Returns the config with different timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        self.connect_timeout_secs = connect_timeout_secs;
        self.read_timeout_secs = read_timeout_secs;
        self
    }

    /// Checks every value against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidWorkerCount`] or [`EngineError::InvalidTimeout`].
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&self.workers) {
            return Err(EngineError::InvalidWorkerCount {
                value: self.workers,
            });
        }
        if self.connect_timeout_secs == 0 {
            return Err(EngineError::InvalidTimeout { name: "connect" });
        }
        if self.read_timeout_secs == 0 {
            return Err(EngineError::InvalidTimeout { name: "read" });
        }
        Ok(())
    }
}

/// How the body was transferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    /// Byte ranges fetched by this many workers.
    Parallel {
        /// Worker count used for the partition.
        workers: usize,
    },
    /// One unranged read of the whole body.
    Sequential,
}

/// A complete, verified download.
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    data: Bytes,
    mode: TransferMode,
    retries: u32,
    verification: Verification,
}

impl DownloadOutcome {
    /// The downloaded content.
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Consumes the outcome, returning the content.
    #[must_use]
    pub fn into_data(self) -> Bytes {
        self.data
    }

    /// Content length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the content is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// How the body was transferred.
    #[must_use]
    pub fn mode(&self) -> TransferMode {
        self.mode
    }

    /// Chunk failures absorbed by the retry budget.
    #[must_use]
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Whether the content was checked against an advertised digest.
    #[must_use]
    pub fn verification(&self) -> Verification {
        self.verification
    }
}

/// Download engine for single resources.
///
/// # Failure Policy
///
/// - Capability-detection problems (no `Accept-Ranges`, bad `Content-Length`,
///   no digest) degrade to a sequential transfer or skip verification
/// - Chunk failures are absorbed by the retry budget
/// - Budget exhaustion and digest mismatches abort; no buffer is returned
///   and nothing is written
#[derive(Debug, Clone)]
pub struct DownloadEngine {
    client: HttpClient,
    config: DownloadConfig,
}

impl DownloadEngine {
    /// Creates an engine, building an HTTP client from the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the config is out of range or the HTTP
    /// client cannot be built.
    ///
    /// # Example
    ///
    /// ```
    /// use rangeget_core::download::{DownloadConfig, DownloadEngine};
    ///
    /// let engine = DownloadEngine::new(DownloadConfig::default()).unwrap();
    /// assert_eq!(engine.config().workers, 4);
    /// ```
    #[instrument(level = "debug")]
    pub fn new(config: DownloadConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let client =
            HttpClient::try_with_timeouts(config.connect_timeout_secs, config.read_timeout_secs)?;
        Ok(Self { client, config })
    }

    /// Creates an engine around an existing client.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the config is out of range.
    pub fn with_client(config: DownloadConfig, client: HttpClient) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self { client, config })
    }

    /// Returns the engine configuration.
    #[must_use]
    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Downloads `url` into memory and verifies it.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if the initial request fails, the sequential
    /// body read fails, the retry budget is exhausted, or the content does
    /// not match the advertised digest.
    #[instrument(skip(self), fields(url = %url, workers = self.config.workers))]
    pub async fn download(&self, url: &str) -> Result<DownloadOutcome, DownloadError> {
        let started = Instant::now();
        info!(url = %url, "GET");

        let response = self.client.get(url).await?;
        info!(status = %response.status(), "response received");

        let headers = TransferHeaders::from_header_map(response.headers());
        let target = DownloadTarget::from_headers(url, &headers);
        debug!(?target, "transfer capabilities");

        let (data, mode, retries) = match target.parallel_len(self.config.workers) {
            Some(total_len) => {
                // The probe body is not needed once ranges are known to work.
                drop(response);
                let transfer = coordinator::transfer(
                    &self.client,
                    url,
                    total_len,
                    self.config.workers,
                    self.config.retry_budget,
                )
                .await?;
                let mode = TransferMode::Parallel {
                    workers: self.config.workers,
                };
                (transfer.buffer, mode, transfer.retries)
            }
            None => {
                debug!(
                    accepts_ranges = target.accepts_ranges(),
                    total_len = ?target.total_len(),
                    "falling back to sequential transfer"
                );
                let data = read_body(response, url).await?;
                (data, TransferMode::Sequential, 0)
            }
        };

        let verification = verify_digest(url, &data, target.expected_digest())?;

        info!(
            bytes = data.len(),
            ?mode,
            retries,
            ?verification,
            elapsed_ms = started.elapsed().as_millis(),
            "download complete"
        );

        Ok(DownloadOutcome {
            data,
            mode,
            retries,
            verification,
        })
    }

    /// Downloads `url` and writes it to `destination`.
    ///
    /// The destination is only created after the content is complete and
    /// verified.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`download`](Self::download) plus
    /// [`DownloadError::Io`] if writing the destination fails.
    #[instrument(skip(self), fields(url = %url, destination = %destination.display()))]
    pub async fn download_to_path(
        &self,
        url: &str,
        destination: &Path,
    ) -> Result<DownloadOutcome, DownloadError> {
        let outcome = self.download(url).await?;
        persist_buffer(destination, outcome.data()).await?;
        Ok(outcome)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_new_valid_worker_counts() {
        for workers in [1, 4, 64] {
            let engine = DownloadEngine::new(DownloadConfig::default().with_workers(workers))
                .unwrap();
            assert_eq!(engine.config().workers, workers);
        }
    }

    #[test]
    fn test_engine_new_invalid_worker_count_zero() {
        let result = DownloadEngine::new(DownloadConfig::default().with_workers(0));
        assert!(matches!(
            result,
            Err(EngineError::InvalidWorkerCount { value: 0 })
        ));
    }

    #[test]
    fn test_engine_new_invalid_worker_count_too_high() {
        let result = DownloadEngine::new(DownloadConfig::default().with_workers(65));
        assert!(matches!(
            result,
            Err(EngineError::InvalidWorkerCount { value: 65 })
        ));
    }

    #[test]
    fn test_engine_rejects_zero_timeouts() {
        let result = DownloadEngine::new(DownloadConfig::default().with_timeouts(0, 10));
        assert!(matches!(
            result,
            Err(EngineError::InvalidTimeout { name: "connect" })
        ));
        let result = DownloadEngine::new(DownloadConfig::default().with_timeouts(10, 0));
        assert!(matches!(
            result,
            Err(EngineError::InvalidTimeout { name: "read" })
        ));
    }

    #[test]
    fn test_default_config_values() {
        let config = DownloadConfig::default();
        assert_eq!(config.workers, 4);
        assert_eq!(config.retry_budget, 8);
        assert_eq!(config.connect_timeout_secs, 30);
        assert_eq!(config.read_timeout_secs, 300);
    }

    #[test]
    fn test_engine_error_display() {
        let msg = EngineError::InvalidWorkerCount { value: 0 }.to_string();
        assert!(msg.contains("invalid worker count"));
        assert!(msg.contains("64"));
    }
}
