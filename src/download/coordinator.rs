//! Transfer coordinator driving parallel chunk workers.
//!
//! # Concurrency Model
//!
//! - The shared buffer is allocated once and split into one disjoint
//!   [`ChunkRegion`] per planned assignment
//! - Each non-empty region is moved into its own Tokio task
//! - Every task reports back through a single [`JoinSet`], which the
//!   coordinator drains in one loop; all per-assignment state and the retry
//!   budget are touched only by that loop
//! - A short or failed chunk is re-dispatched for its unwritten tail only,
//!   under the same index, so at most one worker per index is ever in flight
//! - Dropping the `JoinSet` on a fatal error aborts every outstanding worker

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use super::budget::{RetryBudget, RetryDecision};
use super::chunk::{ChunkRegion, ChunkReport, fetch_chunk};
use super::client::HttpClient;
use super::error::DownloadError;
use super::plan::plan_ranges;

/// Lifecycle of one assignment index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkState {
    Pending,
    InFlight,
    NeedsRemainder,
    Done,
}

/// A fully assembled parallel transfer.
#[derive(Debug)]
pub struct ParallelTransfer {
    /// The assembled content, exactly `total_len` bytes.
    pub buffer: Bytes,
    /// Chunk failures absorbed by the retry budget.
    pub retries: u32,
}

/// Downloads `[0, total_len)` of `url` with `workers` parallel range workers.
///
/// # Errors
///
/// Returns [`DownloadError::RetryBudgetExceeded`] once chunk failures exceed
/// `retry_budget`, [`DownloadError::BufferTooLarge`] if `total_len` cannot be
/// addressed in memory, and [`DownloadError::WorkerLost`] if a worker task
/// panics. The partially filled buffer is dropped in every error case.
#[instrument(skip(client), fields(url = %url))]
pub async fn transfer(
    client: &HttpClient,
    url: &str,
    total_len: u64,
    workers: usize,
    retry_budget: u32,
) -> Result<ParallelTransfer, DownloadError> {
    let url: Arc<str> = Arc::from(url);
    let size =
        usize::try_from(total_len).map_err(|_| DownloadError::buffer_too_large(&*url, total_len))?;

    let plan = plan_ranges(total_len, workers);
    let mut buffer = BytesMut::zeroed(size);
    let mut states = vec![ChunkState::Pending; plan.len()];
    let mut finished: Vec<Option<ChunkRegion>> = (0..plan.len()).map(|_| None).collect();
    let mut budget = RetryBudget::new(retry_budget);
    let mut tasks: JoinSet<ChunkReport> = JoinSet::new();

    info!(total_len, workers = plan.len(), "starting parallel transfer");

    for assignment in plan {
        let len = usize::try_from(assignment.len())
            .map_err(|_| DownloadError::buffer_too_large(&*url, total_len))?;
        let region = ChunkRegion::new(assignment, buffer.split_to(len));
        let index = region.index();

        if region.is_complete() {
            debug!(index, "empty assignment, nothing to fetch");
            states[index] = ChunkState::Done;
            finished[index] = Some(region);
        } else {
            debug!(range = %assignment, "dispatching chunk");
            states[index] = ChunkState::InFlight;
            tasks.spawn(fetch_chunk(client.clone(), Arc::clone(&url), region));
        }
    }

    while states.iter().any(|state| *state != ChunkState::Done) {
        let report = match tasks.join_next().await {
            Some(Ok(report)) => report,
            Some(Err(join_error)) => {
                let index = lost_index(&states);
                return Err(DownloadError::worker_lost(
                    &*url,
                    index,
                    join_error.to_string(),
                ));
            }
            None => {
                return Err(DownloadError::worker_lost(
                    &*url,
                    lost_index(&states),
                    "no worker in flight for an unfinished chunk",
                ));
            }
        };

        let ChunkReport { region, outcome } = report;
        let index = region.index();

        if let Some(error) = outcome.error {
            if !error.is_transfer_failure() {
                return Err(error);
            }
            match budget.record_failure() {
                RetryDecision::Retry { attempt } => {
                    warn!(
                        index,
                        attempt,
                        max_retries = budget.max_retries(),
                        error = %error,
                        "chunk failed, retrying remainder"
                    );
                }
                RetryDecision::Exhausted { reason } => {
                    warn!(index, %reason, "aborting transfer");
                    tasks.abort_all();
                    return Err(DownloadError::retry_budget_exceeded(
                        &*url,
                        budget.max_retries(),
                        error,
                    ));
                }
            }
        }

        if let Some(remainder) = region.pending() {
            states[index] = ChunkState::NeedsRemainder;
            debug!(range = %remainder, written = region.written(), "dispatching remainder");
            tasks.spawn(fetch_chunk(client.clone(), Arc::clone(&url), region));
            states[index] = ChunkState::InFlight;
        } else {
            debug!(index, "chunk complete");
            states[index] = ChunkState::Done;
            finished[index] = Some(region);
        }
    }

    let mut assembled = BytesMut::new();
    for region in finished.into_iter().flatten() {
        assembled.unsplit(region.into_data());
    }

    info!(
        bytes = assembled.len(),
        retries = budget.used(),
        "parallel transfer complete"
    );

    Ok(ParallelTransfer {
        buffer: assembled.freeze(),
        retries: budget.used(),
    })
}

/// Best guess at which index a lost worker belonged to: the lowest one
/// still in flight.
fn lost_index(states: &[ChunkState]) -> usize {
    states
        .iter()
        .position(|state| *state == ChunkState::InFlight)
        .unwrap_or(0)
}
