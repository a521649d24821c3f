//! Parallel byte-range download engine.
//!
//! This module fetches one HTTP resource, splitting the body across
//! concurrent range workers when the server allows it, and verifies the
//! assembled content against a server-advertised MD5 digest.
//!
//! # Features
//!
//! - Capability detection from `Accept-Ranges` / `Content-Length`
//! - Deterministic partition into per-worker byte ranges
//! - Re-dispatch of only the unwritten tail of a short or failed chunk
//! - One retry budget shared by every chunk of a download (8 by default)
//! - MD5 verification from `ETag` or `X-Goog-Hash`
//! - Sequential fallback when ranges are unavailable
//!
//! # Example
//!
//! ```no_run
//! use rangeget_core::download::{DownloadConfig, DownloadEngine};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = DownloadEngine::new(DownloadConfig::default())?;
//! let outcome = engine.download("https://example.com/file.bin").await?;
//! println!("Downloaded {} bytes ({:?})", outcome.len(), outcome.mode());
//! # Ok(())
//! # }
//! ```

mod budget;
mod chunk;
mod client;
mod constants;
mod coordinator;
mod engine;
mod error;
mod filename;
mod header;
mod persist;
mod plan;
mod target;
mod verify;

pub use budget::{RetryBudget, RetryDecision};
pub use chunk::{ChunkOutcome, ChunkRegion, ChunkReport, fetch_chunk};
pub use client::{HttpClient, read_body};
pub use constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_RETRY_BUDGET, DEFAULT_WORKERS, MAX_WORKERS, MIN_WORKERS,
    READ_TIMEOUT_SECS,
};
pub use coordinator::{ParallelTransfer, transfer};
pub use engine::{DownloadConfig, DownloadEngine, DownloadOutcome, EngineError, TransferMode};
pub use error::DownloadError;
pub use filename::default_output_name;
pub use header::{ExpectedDigest, HeaderError, TransferHeaders, X_GOOG_HASH};
pub use persist::persist_buffer;
pub use plan::{ChunkAssignment, plan_ranges};
pub use target::DownloadTarget;
pub use verify::{Verification, md5_digest, verify_digest};

// Note: no module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
