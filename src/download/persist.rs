//! Writing a verified buffer to its destination.

use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};

use super::error::DownloadError;

/// Writes `data` to `path`, replacing any existing file.
///
/// Only called with a complete, verified buffer. If writing fails part way,
/// the partial file is removed so no truncated artifact is left behind.
///
/// # Errors
///
/// Returns [`DownloadError::Io`] if the file cannot be created or written.
#[instrument(skip(data), fields(path = %path.display(), bytes = data.len()))]
pub async fn persist_buffer(path: &Path, data: &[u8]) -> Result<u64, DownloadError> {
    let file = File::create(path)
        .await
        .map_err(|e| DownloadError::io(path, e))?;

    if let Err(error) = write_all(file, path, data).await {
        debug!(path = %path.display(), "cleaning up partial file after error");
        let _ = tokio::fs::remove_file(path).await;
        return Err(error);
    }

    info!(path = %path.display(), bytes = data.len(), "file written");
    Ok(data.len() as u64)
}

async fn write_all(file: File, path: &Path, data: &[u8]) -> Result<(), DownloadError> {
    let mut writer = BufWriter::new(file);
    writer
        .write_all(data)
        .await
        .map_err(|e| DownloadError::io(path, e))?;
    // Ensure all data is flushed to disk
    writer.flush().await.map_err(|e| DownloadError::io(path, e))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_persist_writes_exact_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.bin");

        let written = persist_buffer(&path, b"assembled content").await.unwrap();

        assert_eq!(written, 17);
        assert_eq!(std::fs::read(&path).unwrap(), b"assembled content");
    }

    #[tokio::test]
    async fn test_persist_replaces_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.bin");
        std::fs::write(&path, b"old content that is longer").unwrap();

        persist_buffer(&path, b"new").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_persist_missing_directory_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("out.bin");

        let result = persist_buffer(&path, b"data").await;

        assert!(matches!(result, Err(DownloadError::Io { .. })));
        assert!(!path.exists());
    }
}
