//! Rangeget Core Library
//!
//! This library fetches a single HTTP resource into memory, splitting the
//! transfer across parallel byte-range workers when the server supports it,
//! and verifies the assembled content against a server-advertised digest
//! before anything is written to disk.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`download`] - header interpretation, range planning, chunk workers,
//!   the transfer coordinator, integrity verification and persistence

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
#[cfg(test)]
pub mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use download::{
    CONNECT_TIMEOUT_SECS, ChunkAssignment, DEFAULT_RETRY_BUDGET, DEFAULT_WORKERS, DownloadConfig,
    DownloadEngine, DownloadError, DownloadOutcome, DownloadTarget, EngineError, ExpectedDigest,
    HeaderError, HttpClient, MAX_WORKERS, MIN_WORKERS, READ_TIMEOUT_SECS, TransferHeaders,
    TransferMode, Verification, default_output_name, plan_ranges,
};
