//! One bounded range fetch into a worker-owned region of the shared buffer.
//!
//! The shared buffer is split into one [`ChunkRegion`] per assignment. A
//! region is moved into the worker that fills it and moved back to the
//! coordinator inside the [`ChunkReport`], so at any instant exactly one
//! party can write a given byte and no locking is needed.

use std::sync::Arc;

use bytes::BytesMut;
use futures_util::StreamExt;
use tracing::debug;

use super::client::{HttpClient, map_reqwest_error};
use super::error::DownloadError;
use super::plan::ChunkAssignment;

/// The slice of the shared buffer backing one assignment.
#[derive(Debug)]
pub struct ChunkRegion {
    assignment: ChunkAssignment,
    data: BytesMut,
    written: u64,
}

impl ChunkRegion {
    /// Wraps `data`, which must be exactly `assignment.len()` bytes long.
    #[must_use]
    pub fn new(assignment: ChunkAssignment, data: BytesMut) -> Self {
        debug_assert_eq!(data.len() as u64, assignment.len());
        Self {
            assignment,
            data,
            written: 0,
        }
    }

    /// Worker index of the region.
    #[must_use]
    pub fn index(&self) -> usize {
        self.assignment.index()
    }

    /// The original, full assignment.
    #[must_use]
    pub fn assignment(&self) -> &ChunkAssignment {
        &self.assignment
    }

    /// Bytes written so far, accumulated across attempts.
    #[must_use]
    pub fn written(&self) -> u64 {
        self.written
    }

    /// The range still to fetch, or `None` once every byte landed.
    #[must_use]
    pub fn pending(&self) -> Option<ChunkAssignment> {
        self.assignment.remainder(self.written)
    }

    /// Whether every byte of the assignment has been written.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.pending().is_none()
    }

    /// Releases the backing bytes for reassembly.
    #[must_use]
    pub fn into_data(self) -> BytesMut {
        self.data
    }

    fn unwritten_mut(&mut self) -> &mut [u8] {
        let offset = usize::try_from(self.written).unwrap_or(self.data.len());
        &mut self.data[offset..]
    }
}

/// Result of one fetch attempt.
#[derive(Debug)]
pub struct ChunkOutcome {
    /// Bytes written during this attempt.
    pub written: u64,
    /// Why the attempt stopped short, if it did.
    pub error: Option<DownloadError>,
}

impl ChunkOutcome {
    fn complete(written: u64) -> Self {
        Self {
            written,
            error: None,
        }
    }

    fn failed(written: u64, error: DownloadError) -> Self {
        Self {
            written,
            error: Some(error),
        }
    }
}

/// What a finishing worker hands back to the coordinator: its region
/// (with `written` already advanced) and the attempt outcome.
#[derive(Debug)]
pub struct ChunkReport {
    /// The region, returned to the coordinator.
    pub region: ChunkRegion,
    /// Outcome of the attempt that just finished.
    pub outcome: ChunkOutcome,
}

/// Fetches the pending part of `region` and writes it in place.
///
/// Never fails as a future: every failure is carried in the report so the
/// coordinator can decide whether to re-dispatch the remainder.
pub async fn fetch_chunk(client: HttpClient, url: Arc<str>, mut region: ChunkRegion) -> ChunkReport {
    let Some(pending) = region.pending() else {
        return ChunkReport {
            region,
            outcome: ChunkOutcome::complete(0),
        };
    };

    let outcome = match client.get_range(&url, &pending).await {
        Ok(response) => copy_body(response, &url, &pending, region.unwritten_mut()).await,
        Err(error) => ChunkOutcome::failed(0, error),
    };

    region.written += outcome.written;
    debug!(
        url = %url,
        range = %pending,
        written = outcome.written,
        failed = outcome.error.is_some(),
        "chunk attempt finished"
    );

    ChunkReport { region, outcome }
}

/// Streams `response` into `dst`, stopping once `dst` is full.
///
/// Bytes the server sends past the requested range are ignored.
async fn copy_body(
    response: reqwest::Response,
    url: &str,
    range: &ChunkAssignment,
    dst: &mut [u8],
) -> ChunkOutcome {
    let mut stream = response.bytes_stream();
    let mut filled = 0usize;

    while filled < dst.len() {
        match stream.next().await {
            Some(Ok(chunk)) => {
                let take = chunk.len().min(dst.len() - filled);
                dst[filled..filled + take].copy_from_slice(&chunk[..take]);
                filled += take;
            }
            Some(Err(e)) => return ChunkOutcome::failed(filled as u64, map_reqwest_error(url, e)),
            None => break,
        }
    }

    let written = filled as u64;
    if filled < dst.len() {
        return ChunkOutcome::failed(
            written,
            DownloadError::short_transfer(url, range.start(), range.end(), written),
        );
    }
    ChunkOutcome::complete(written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, ResponseTemplate};

    fn region(index: usize, start: u64, end: u64) -> ChunkRegion {
        let assignment = ChunkAssignment::new(index, start, end);
        let len = usize::try_from(assignment.len()).unwrap();
        ChunkRegion::new(assignment, BytesMut::zeroed(len))
    }

    #[test]
    fn test_region_pending_tracks_written() {
        let mut r = region(1, 100, 200);
        assert_eq!(r.pending(), Some(ChunkAssignment::new(1, 100, 200)));
        r.written = 40;
        assert_eq!(r.pending(), Some(ChunkAssignment::new(1, 140, 200)));
        r.written = 100;
        assert!(r.is_complete());
    }

    #[test]
    fn test_empty_region_is_complete() {
        assert!(region(0, 0, 0).is_complete());
    }

    #[tokio::test]
    async fn test_fetch_chunk_fills_region() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };

        Mock::given(method("GET"))
            .and(path("/file.bin"))
            .and(header("range", "bytes=4-7"))
            .respond_with(ResponseTemplate::new(206).set_body_bytes(b"efgh".to_vec()))
            .mount(&mock_server)
            .await;

        let url: Arc<str> = format!("{}/file.bin", mock_server.uri()).into();
        let report = fetch_chunk(HttpClient::new(), url, region(1, 4, 8)).await;

        assert!(report.outcome.error.is_none());
        assert_eq!(report.outcome.written, 4);
        assert!(report.region.is_complete());
        assert_eq!(report.region.into_data().as_ref(), b"efgh");
    }

    #[tokio::test]
    async fn test_fetch_chunk_short_read_reports_partial_progress() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };

        Mock::given(method("GET"))
            .and(path("/file.bin"))
            .and(header("range", "bytes=0-9"))
            .respond_with(ResponseTemplate::new(206).set_body_bytes(b"abc".to_vec()))
            .mount(&mock_server)
            .await;

        let url: Arc<str> = format!("{}/file.bin", mock_server.uri()).into();
        let report = fetch_chunk(HttpClient::new(), url, region(0, 0, 10)).await;

        assert_eq!(report.outcome.written, 3);
        assert!(matches!(
            report.outcome.error,
            Some(DownloadError::ShortTransfer { received: 3, .. })
        ));
        assert_eq!(
            report.region.pending(),
            Some(ChunkAssignment::new(0, 3, 10))
        );
        assert_eq!(&report.region.into_data()[..3], b"abc");
    }

    #[tokio::test]
    async fn test_fetch_chunk_ignores_bytes_past_range() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };

        Mock::given(method("GET"))
            .and(path("/file.bin"))
            .respond_with(ResponseTemplate::new(206).set_body_bytes(b"abcdefgh".to_vec()))
            .mount(&mock_server)
            .await;

        let url: Arc<str> = format!("{}/file.bin", mock_server.uri()).into();
        let report = fetch_chunk(HttpClient::new(), url, region(0, 0, 4)).await;

        assert!(report.outcome.error.is_none());
        assert_eq!(report.region.into_data().as_ref(), b"abcd");
    }

    #[tokio::test]
    async fn test_fetch_chunk_http_error_writes_nothing() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };

        Mock::given(method("GET"))
            .and(path("/file.bin"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let url: Arc<str> = format!("{}/file.bin", mock_server.uri()).into();
        let report = fetch_chunk(HttpClient::new(), url, region(2, 8, 12)).await;

        assert_eq!(report.outcome.written, 0);
        assert!(matches!(
            report.outcome.error,
            Some(DownloadError::HttpStatus { status: 503, .. })
        ));
        assert_eq!(report.region.written(), 0);
    }
}
