//! Default destination names derived from the resource URL.

use std::path::{Component, Path};

use tracing::debug;
use url::Url;

/// Name used when the URL has no usable last path segment.
const FALLBACK_FILENAME: &str = "download.bin";

/// Derives a safe local filename from the last path segment of `url`.
///
/// Percent-encoding is decoded and characters that are invalid on common
/// filesystems are replaced. Falls back to `download.bin`.
#[must_use]
pub fn default_output_name(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return FALLBACK_FILENAME.to_string();
    };

    if let Some(mut segments) = parsed.path_segments()
        && let Some(last) = segments.next_back()
        && !last.is_empty()
    {
        let decoded = urlencoding::decode(last).unwrap_or_else(|e| {
            debug!(
                segment = %last,
                error = %e,
                "URL decoding failed, using raw segment"
            );
            last.into()
        });
        return sanitize_filename(&decoded);
    }

    FALLBACK_FILENAME.to_string()
}

/// Sanitizes filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
