//! Typed interpretation of the transfer-capability response headers.
//!
//! [`TransferHeaders`] captures the raw values of the headers the engine
//! cares about and exposes them through three accessors:
//!
//! - [`TransferHeaders::accepts_ranges`] - may the resource be fetched in byte ranges?
//! - [`TransferHeaders::content_length`] - how long is the resource?
//! - [`TransferHeaders::digest`] - what digest should the assembled bytes have?
//!
//! None of these failures abort a download: a missing or malformed length
//! degrades to a sequential transfer and a missing digest skips verification.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, ETAG, HeaderMap, HeaderName};
use thiserror::Error;

/// Hash-list header carrying `algorithm=base64digest` entries.
pub const X_GOOG_HASH: &str = "x-goog-hash";

/// Tag identifying the digest algorithm inside a hash-list entry.
const MD5_TAG: &str = "md5=";

/// Length of an MD5 digest rendered as hex.
const MD5_HEX_LEN: usize = 32;

/// Errors produced while interpreting transfer headers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    /// The header is not present at all.
    #[error("{header} not found in response headers")]
    Missing {
        /// Header name.
        header: &'static str,
    },

    /// The header is present but could not be interpreted.
    #[error("could not parse {header}: {reason}")]
    Parse {
        /// Header name.
        header: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// Neither an entity tag nor an md5 hash-list entry is present.
    #[error("no content digest found in response headers")]
    DigestNotFound,

    /// An md5 hash-list entry is present but is not valid base64.
    #[error("invalid md5 digest in {header}: {reason}")]
    InvalidDigest {
        /// Header name.
        header: &'static str,
        /// Decoder error.
        reason: String,
    },
}

/// Expected digest of the resource, as advertised by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedDigest {
    /// Entity tag value, quotes stripped, otherwise verbatim.
    EntityTag(String),
    /// Raw MD5 bytes decoded from a hash-list entry.
    Md5(Vec<u8>),
}

impl ExpectedDigest {
    /// Returns true if `computed` (raw MD5 bytes) satisfies this digest.
    ///
    /// Entity tags are compared against the lowercase hex rendering of the
    /// digest, ignoring ASCII case.
    #[must_use]
    pub fn matches(&self, computed: &[u8]) -> bool {
        match self {
            Self::EntityTag(tag) => tag.eq_ignore_ascii_case(&hex::encode(computed)),
            Self::Md5(expected) => expected.as_slice() == computed,
        }
    }
}

impl fmt::Display for ExpectedDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EntityTag(tag) => write!(f, "etag {tag}"),
            Self::Md5(bytes) => write!(f, "md5 {}", hex::encode(bytes)),
        }
    }
}

/// Raw values of the capability headers from one response.
///
/// Every header may legitimately appear more than once, so values are kept
/// as lists and multiplicity is judged by the accessors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferHeaders {
    accept_ranges: Vec<String>,
    content_length: Vec<String>,
    etag: Vec<String>,
    hash_list: Vec<String>,
}

impl TransferHeaders {
    /// Captures the capability headers from a response header map.
    #[must_use]
    pub fn from_header_map(headers: &HeaderMap) -> Self {
        Self {
            accept_ranges: values(headers, &ACCEPT_RANGES),
            content_length: values(headers, &CONTENT_LENGTH),
            etag: values(headers, &ETAG),
            hash_list: values(headers, &HeaderName::from_static(X_GOOG_HASH)),
        }
    }

    /// Returns true if the server advertises byte-range support.
    ///
    /// False when `Accept-Ranges` is absent, repeated, or `none`.
    #[must_use]
    pub fn accepts_ranges(&self) -> bool {
        match self.accept_ranges.as_slice() {
            [value] => !value.trim().eq_ignore_ascii_case("none"),
            _ => false,
        }
    }

    /// Returns the advertised length of the resource in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::Missing`] if `Content-Length` is absent and
    /// [`HeaderError::Parse`] if it is repeated or not a non-negative integer.
    pub fn content_length(&self) -> Result<u64, HeaderError> {
        match self.content_length.as_slice() {
            [] => Err(HeaderError::Missing {
                header: "Content-Length",
            }),
            [value] => value.trim().parse::<u64>().map_err(|e| HeaderError::Parse {
                header: "Content-Length",
                reason: format!("{value:?}: {e}"),
            }),
            many => Err(HeaderError::Parse {
                header: "Content-Length",
                reason: format!("expected exactly one value, found {}", many.len()),
            }),
        }
    }

    /// Returns the digest the assembled content is expected to have.
    ///
    /// An entity tag shaped like an MD5 (32 hex digits, strong) wins;
    /// otherwise the first `md5=` entry of the hash-list header is
    /// base64-decoded. Weak tags (`W/"..."`) and opaque validators such as
    /// nginx's `"<mtime>-<size>"` or S3 multipart `"<hash>-<parts>"` are not
    /// digests and fall through to the hash list.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::DigestNotFound`] when neither source is present
    /// and [`HeaderError::InvalidDigest`] when the md5 entry is not base64.
    pub fn digest(&self) -> Result<ExpectedDigest, HeaderError> {
        if let Some(tag) = self.etag.first().and_then(|tag| md5_entity_tag(tag)) {
            return Ok(ExpectedDigest::EntityTag(tag.to_string()));
        }

        let encoded = self
            .hash_list
            .iter()
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .find_map(|entry| entry.strip_prefix(MD5_TAG))
            .ok_or(HeaderError::DigestNotFound)?;

        STANDARD
            .decode(encoded)
            .map(ExpectedDigest::Md5)
            .map_err(|e| HeaderError::InvalidDigest {
                header: "X-Goog-Hash",
                reason: e.to_string(),
            })
    }
}

/// Unquoted value of a strong entity tag holding a hex MD5, if it is one.
fn md5_entity_tag(raw: &str) -> Option<&str> {
    let tag = raw.trim();
    if tag.starts_with("W/") {
        return None;
    }
    let tag = tag.trim_matches('"');
    (tag.len() == MD5_HEX_LEN && tag.bytes().all(|b| b.is_ascii_hexdigit())).then_some(tag)
}

fn values(headers: &HeaderMap, name: &HeaderName) -> Vec<String> {
    headers
        .get_all(name)
        .iter()
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> TransferHeaders {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
        TransferHeaders::from_header_map(&map)
    }

    #[test]
    fn test_accepts_ranges_bytes() {
        assert!(headers(&[("accept-ranges", "bytes")]).accepts_ranges());
    }

    #[test]
    fn test_accepts_ranges_absent_is_false() {
        assert!(!headers(&[]).accepts_ranges());
    }

    #[test]
    fn test_accepts_ranges_none_is_false() {
        assert!(!headers(&[("accept-ranges", "none")]).accepts_ranges());
    }

    #[test]
    fn test_accepts_ranges_repeated_is_false() {
        let h = headers(&[("accept-ranges", "bytes"), ("accept-ranges", "bytes")]);
        assert!(!h.accepts_ranges());
    }

    #[test]
    fn test_content_length_parses() {
        assert_eq!(
            headers(&[("content-length", "1000")]).content_length(),
            Ok(1000)
        );
    }

    #[test]
    fn test_content_length_zero() {
        assert_eq!(headers(&[("content-length", "0")]).content_length(), Ok(0));
    }

    #[test]
    fn test_content_length_missing() {
        assert!(matches!(
            headers(&[]).content_length(),
            Err(HeaderError::Missing { .. })
        ));
    }

    #[test]
    fn test_content_length_negative_is_parse_error() {
        assert!(matches!(
            headers(&[("content-length", "-5")]).content_length(),
            Err(HeaderError::Parse { .. })
        ));
    }

    #[test]
    fn test_content_length_garbage_is_parse_error() {
        assert!(matches!(
            headers(&[("content-length", "lots")]).content_length(),
            Err(HeaderError::Parse { .. })
        ));
    }

    #[test]
    fn test_content_length_repeated_is_parse_error() {
        let h = headers(&[("content-length", "10"), ("content-length", "10")]);
        assert!(matches!(
            h.content_length(),
            Err(HeaderError::Parse { .. })
        ));
    }

    #[test]
    fn test_digest_prefers_etag() {
        let h = headers(&[
            ("etag", "\"9e107d9d372bb6826bd81d3542a419d6\""),
            ("x-goog-hash", "md5=nhB9nTcrtoJr2B01QqQZ1g=="),
        ]);
        assert_eq!(
            h.digest(),
            Ok(ExpectedDigest::EntityTag(
                "9e107d9d372bb6826bd81d3542a419d6".to_string()
            ))
        );
    }

    #[test]
    fn test_digest_from_goog_hash_md5_entry() {
        let h = headers(&[
            ("x-goog-hash", "crc32c=n03x6A=="),
            ("x-goog-hash", "md5=nhB9nTcrtoJr2B01QqQZ1g=="),
        ]);
        let digest = h.digest().unwrap();
        assert_eq!(
            digest,
            ExpectedDigest::Md5(hex::decode("9e107d9d372bb6826bd81d3542a419d6").unwrap())
        );
    }

    #[test]
    fn test_digest_from_comma_joined_goog_hash() {
        let h = headers(&[("x-goog-hash", "crc32c=n03x6A==, md5=nhB9nTcrtoJr2B01QqQZ1g==")]);
        assert!(matches!(h.digest(), Ok(ExpectedDigest::Md5(_))));
    }

    #[test]
    fn test_digest_weak_etag_falls_through_to_hash_list() {
        let h = headers(&[
            ("etag", "W/\"abc\""),
            ("x-goog-hash", "md5=nhB9nTcrtoJr2B01QqQZ1g=="),
        ]);
        assert!(matches!(h.digest(), Ok(ExpectedDigest::Md5(_))));
    }

    #[test]
    fn test_digest_opaque_etag_falls_through_to_hash_list() {
        let h = headers(&[
            ("etag", "\"5f1e2a3b-3e8\""),
            ("x-goog-hash", "md5=nhB9nTcrtoJr2B01QqQZ1g=="),
        ]);
        assert!(matches!(h.digest(), Ok(ExpectedDigest::Md5(_))));
    }

    #[test]
    fn test_digest_multipart_etag_alone_is_not_a_digest() {
        let h = headers(&[("etag", "\"9e107d9d372bb6826bd81d3542a419d6-3\"")]);
        assert_eq!(h.digest(), Err(HeaderError::DigestNotFound));
    }

    #[test]
    fn test_digest_uppercase_hex_etag_accepted() {
        let h = headers(&[("etag", "\"9E107D9D372BB6826BD81D3542A419D6\"")]);
        assert!(matches!(h.digest(), Ok(ExpectedDigest::EntityTag(_))));
    }

    #[test]
    fn test_digest_not_found() {
        let h = headers(&[("x-goog-hash", "crc32c=n03x6A==")]);
        assert_eq!(h.digest(), Err(HeaderError::DigestNotFound));
    }

    #[test]
    fn test_digest_invalid_base64() {
        let h = headers(&[("x-goog-hash", "md5=***")]);
        assert!(matches!(
            h.digest(),
            Err(HeaderError::InvalidDigest { .. })
        ));
    }

    #[test]
    fn test_expected_digest_matches_hex_etag_case_insensitive() {
        let raw = hex::decode("9e107d9d372bb6826bd81d3542a419d6").unwrap();
        let tag = ExpectedDigest::EntityTag("9E107D9D372BB6826BD81D3542A419D6".to_string());
        assert!(tag.matches(&raw));
        assert!(!ExpectedDigest::EntityTag("deadbeef".to_string()).matches(&raw));
    }
}
