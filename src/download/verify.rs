//! Integrity verification of an assembled buffer.

use md5::{Digest, Md5};
use tracing::{debug, info};

use super::error::DownloadError;
use super::header::ExpectedDigest;

/// Whether the content was checked against a digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// The computed digest matched the advertised one.
    Verified,
    /// No usable digest was advertised.
    Skipped,
}

/// Computes the MD5 digest of `data`.
#[must_use]
pub fn md5_digest(data: &[u8]) -> Vec<u8> {
    Md5::digest(data).to_vec()
}

/// Checks `data` against `expected`.
///
/// # Errors
///
/// Returns [`DownloadError::ChecksumMismatch`] if a digest is expected and
/// the computed one differs.
pub fn verify_digest(
    url: &str,
    data: &[u8],
    expected: Option<&ExpectedDigest>,
) -> Result<Verification, DownloadError> {
    let Some(expected) = expected else {
        debug!(url = %url, "no expected digest; skipping verification");
        return Ok(Verification::Skipped);
    };

    let computed = md5_digest(data);
    if !expected.matches(&computed) {
        return Err(DownloadError::checksum_mismatch(
            url,
            expected.to_string(),
            hex::encode(&computed),
        ));
    }

    info!(url = %url, digest = %hex::encode(&computed), "MD5 checksums match");
    Ok(Verification::Verified)
}
