//! The immutable description of what is being downloaded.

use tracing::debug;

use super::header::{ExpectedDigest, HeaderError, TransferHeaders};

/// Resource locator plus the capabilities derived from its initial response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    url: String,
    total_len: Option<u64>,
    accepts_ranges: bool,
    expected_digest: Option<ExpectedDigest>,
}

impl DownloadTarget {
    /// Derives a target from the initial response headers.
    ///
    /// Header problems never fail here: an unusable length becomes `None`
    /// and an absent or malformed digest disables verification.
    #[must_use]
    pub fn from_headers(url: impl Into<String>, headers: &TransferHeaders) -> Self {
        let url = url.into();

        let total_len = headers
            .content_length()
            .inspect_err(|e| debug!(url = %url, error = %e, "length unknown"))
            .ok();

        let expected_digest = match headers.digest() {
            Ok(digest) => Some(digest),
            Err(HeaderError::DigestNotFound) => {
                debug!(url = %url, "no digest advertised; verification skipped");
                None
            }
            Err(e) => {
                debug!(url = %url, error = %e, "unusable digest; verification skipped");
                None
            }
        };

        Self {
            url,
            total_len,
            accepts_ranges: headers.accepts_ranges(),
            expected_digest,
        }
    }

    /// The resource locator.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Advertised length, if it was usable.
    #[must_use]
    pub fn total_len(&self) -> Option<u64> {
        self.total_len
    }

    /// Whether the server advertises byte-range support.
    #[must_use]
    pub fn accepts_ranges(&self) -> bool {
        self.accepts_ranges
    }

    /// Digest the assembled content must match, if any.
    #[must_use]
    pub fn expected_digest(&self) -> Option<&ExpectedDigest> {
        self.expected_digest.as_ref()
    }

    /// Returns the total length to partition when a parallel transfer with
    /// `workers` workers is possible, or `None` when the sequential fallback
    /// must be used.
    #[must_use]
    pub fn parallel_len(&self, workers: usize) -> Option<u64> {
        if workers <= 1 || !self.accepts_ranges {
            return None;
        }
        self.total_len
    }
}
