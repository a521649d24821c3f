//! HTTP client wrapper for whole-body and ranged requests.
//!
//! This module provides the `HttpClient` struct which issues the initial
//! capability-probing request, the per-chunk ranged requests, and the
//! sequential body read used when a parallel transfer is not possible.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use reqwest::header::{CONTENT_RANGE, HeaderMap, RANGE};
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use super::plan::ChunkAssignment;
use crate::user_agent;

/// HTTP client for range-aware downloads.
///
/// This client is designed to be created once and shared by every chunk
/// worker of a download; cloning is cheap and shares the connection pool.
///
/// # Example
///
/// ```no_run
/// use rangeget_core::download::HttpClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let response = client.get("https://example.com/file.bin").await?;
/// println!("status: {}", response.status());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes of silence between body reads
    /// - No content-encoding negotiation (identity bodies only)
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::try_with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
            .expect("failed to build HTTP client with static configuration")
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Errors
    ///
    /// Returns the builder error if the TLS backend or system configuration
    /// cannot be initialized.
    pub fn try_with_timeouts(
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .read_timeout(Duration::from_secs(read_timeout_secs))
            .user_agent(user_agent::default_download_user_agent())
            .build()?;
        Ok(Self { client })
    }

    /// Issues an unranged GET for `url`.
    ///
    /// The response body is left unread so the caller can either stream it
    /// (sequential transfer) or drop it after inspecting the headers.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if the URL is invalid, the request fails, or
    /// the server returns a non-success status.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get(&self, url: &str) -> Result<reqwest::Response, DownloadError> {
        Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
        self.send_request(url, None).await
    }

    /// Issues a GET restricted to `assignment` with a `Range` header.
    ///
    /// A `200 OK` answer is only accepted when the range starts at byte 0,
    /// since the body then still begins at the right offset. A `206` whose
    /// `Content-Range` starts elsewhere is rejected so shifted bytes never
    /// land in the region.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::RangeIgnored` when the server replied with the
    /// whole body for a range starting past 0 or with a different range,
    /// plus the errors of [`get`](Self::get).
    #[instrument(level = "debug", skip(self), fields(url = %url, range = %assignment))]
    pub async fn get_range(
        &self,
        url: &str,
        assignment: &ChunkAssignment,
    ) -> Result<reqwest::Response, DownloadError> {
        let range = assignment.range_header();
        let response = self.send_request(url, range.as_deref()).await?;

        if response.status() == StatusCode::PARTIAL_CONTENT {
            if let Some(start) = content_range_start(response.headers())
                && start != assignment.start()
            {
                debug!(expected = assignment.start(), start, "Content-Range mismatch");
                return Err(DownloadError::range_ignored(url, assignment.start()));
            }
        } else if assignment.start() > 0 {
            return Err(DownloadError::range_ignored(url, assignment.start()));
        }

        Ok(response)
    }

    async fn send_request(
        &self,
        url: &str,
        range_header: Option<&str>,
    ) -> Result<reqwest::Response, DownloadError> {
        let mut request = self.client.get(url);
        if let Some(range) = range_header {
            request = request.header(RANGE, range);
        }

        let response = request.send().await.map_err(|e| map_reqwest_error(url, e))?;

        if !response.status().is_success() {
            return Err(DownloadError::http_status(url, response.status().as_u16()));
        }

        Ok(response)
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// Reads a whole response body into memory.
///
/// Used by the sequential fallback; the buffer grows to whatever size the
/// body turns out to be.
///
/// # Errors
///
/// Returns `DownloadError::Network` or `DownloadError::Timeout` if the body
/// stream fails before completion.
pub async fn read_body(response: reqwest::Response, url: &str) -> Result<Bytes, DownloadError> {
    let capacity = response
        .content_length()
        .and_then(|len| usize::try_from(len).ok())
        .unwrap_or(0);
    let mut buffer = BytesMut::with_capacity(capacity);
    let mut stream = response.bytes_stream();

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| map_reqwest_error(url, e))?;
        buffer.extend_from_slice(&chunk);
    }

    debug!(url = %url, bytes = buffer.len(), "body read sequentially");
    Ok(buffer.freeze())
}

/// First byte position of a `Content-Range: bytes <first>-<last>/<len>` header.
fn content_range_start(headers: &HeaderMap) -> Option<u64> {
    let value = headers.get(CONTENT_RANGE)?.to_str().ok()?;
    let (first, _) = value.trim().strip_prefix("bytes ")?.split_once('-')?;
    first.trim().parse().ok()
}

pub(crate) fn map_reqwest_error(url: &str, error: reqwest::Error) -> DownloadError {
    if error.is_timeout() {
        DownloadError::timeout(url)
    } else {
        DownloadError::network(url, error)
    }
}
