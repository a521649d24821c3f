//! Constants for the download module (timeouts, workers, retry budget).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes).
///
/// Bounds the idle gap between reads, not the whole transfer: a request
/// that receives nothing for this long fails with a timeout and is charged
/// to the retry budget, while a slow but steady body never trips it.
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Default number of chunk failures a whole download may absorb.
pub const DEFAULT_RETRY_BUDGET: u32 = 8;

/// Default number of parallel range workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Minimum allowed worker count.
pub const MIN_WORKERS: usize = 1;

/// Maximum allowed worker count.
pub const MAX_WORKERS: usize = 64;
