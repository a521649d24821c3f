//! Error types for the download module.
//!
//! This module defines structured errors for all download operations,
//! providing context-rich error messages for debugging and user feedback.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while fetching, assembling, verifying or
/// persisting a resource.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors,
    /// body read interrupted, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The server answered a ranged request with the full body.
    #[error("server ignored range request bytes={start}- for {url}")]
    RangeIgnored {
        /// The URL that was requested.
        url: String,
        /// First byte of the requested range.
        start: u64,
    },

    /// Fewer bytes arrived than the requested range required.
    #[error("short transfer for {url}: range [{start}, {end}) received {received} bytes")]
    ShortTransfer {
        /// The URL that was requested.
        url: String,
        /// First byte of the requested range.
        start: u64,
        /// End of the requested range (exclusive).
        end: u64,
        /// Bytes actually received for the range.
        received: u64,
    },

    /// The advertised length does not fit in addressable memory.
    #[error("resource {url} is too large to buffer: {bytes} bytes")]
    BufferTooLarge {
        /// The URL being downloaded.
        url: String,
        /// The advertised length.
        bytes: u64,
    },

    /// The assembled content does not match the expected digest.
    #[error("checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The URL that was downloaded.
        url: String,
        /// Expected digest as advertised by the server.
        expected: String,
        /// Digest computed over the assembled content (lowercase hex).
        actual: String,
    },

    /// Chunk failures across the whole download exceeded the retry budget.
    #[error("retry budget of {budget} exhausted downloading {url}")]
    RetryBudgetExceeded {
        /// The URL being downloaded.
        url: String,
        /// The configured budget.
        budget: u32,
        /// The failure that tipped the budget over.
        #[source]
        last_error: Box<DownloadError>,
    },

    /// A chunk worker terminated without reporting (panic or cancellation).
    #[error("chunk worker {index} for {url} did not report: {reason}")]
    WorkerLost {
        /// The URL being downloaded.
        url: String,
        /// Assignment index of the lost worker, when known.
        index: usize,
        /// Why the worker was lost.
        reason: String,
    },

    /// File system error while writing the destination.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a range-ignored error.
    pub fn range_ignored(url: impl Into<String>, start: u64) -> Self {
        Self::RangeIgnored {
            url: url.into(),
            start,
        }
    }

    /// Creates a short transfer error for the range `[start, end)`.
    pub fn short_transfer(url: impl Into<String>, start: u64, end: u64, received: u64) -> Self {
        Self::ShortTransfer {
            url: url.into(),
            start,
            end,
            received,
        }
    }

    /// Creates a buffer-too-large error.
    pub fn buffer_too_large(url: impl Into<String>, bytes: u64) -> Self {
        Self::BufferTooLarge {
            url: url.into(),
            bytes,
        }
    }

    /// Creates a checksum mismatch error.
    pub fn checksum_mismatch(
        url: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::ChecksumMismatch {
            url: url.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates a retry-budget-exceeded error wrapping the last chunk failure.
    pub fn retry_budget_exceeded(url: impl Into<String>, budget: u32, last_error: Self) -> Self {
        Self::RetryBudgetExceeded {
            url: url.into(),
            budget,
            last_error: Box::new(last_error),
        }
    }

    /// Creates a worker-lost error.
    pub fn worker_lost(url: impl Into<String>, index: usize, reason: impl Into<String>) -> Self {
        Self::WorkerLost {
            url: url.into(),
            index,
            reason: reason.into(),
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true for failures of a single transfer attempt, which the
    /// coordinator may absorb by re-dispatching the unwritten remainder.
    #[must_use]
    pub fn is_transfer_failure(&self) -> bool {
        matches!(
            self,
            Self::Network { .. }
                | Self::Timeout { .. }
                | Self::HttpStatus { .. }
                | Self::RangeIgnored { .. }
                | Self::ShortTransfer { .. }
        )
    }
}

// No `From<reqwest::Error>` or `From<std::io::Error>`: every variant needs a
// URL or path the source error does not carry.
