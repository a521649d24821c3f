//! Global retry budget for one download.
//!
//! Every failed chunk attempt, whatever chunk it belongs to, draws from the
//! same [`RetryBudget`]. The download is aborted as soon as the number of
//! failures exceeds the budget.
//!
//! # Example
//!
//! ```
//! use rangeget_core::download::{RetryBudget, RetryDecision};
//!
//! let mut budget = RetryBudget::new(1);
//! assert!(matches!(budget.record_failure(), RetryDecision::Retry { .. }));
//! assert!(matches!(budget.record_failure(), RetryDecision::Exhausted { .. }));
//! ```

use tracing::debug;

use super::constants::DEFAULT_RETRY_BUDGET;

/// Decision after recording a chunk failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// The failure fits in the budget; re-dispatch the remainder.
    Retry {
        /// How many failures have been absorbed so far (1-indexed).
        attempt: u32,
    },

    /// The budget is exceeded; abort the download.
    Exhausted {
        /// Human-readable reason.
        reason: String,
    },
}

/// Counter of chunk failures bounded by a fixed maximum.
///
/// Owned by the transfer coordinator's control loop; workers never touch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryBudget {
    max_retries: u32,
    used: u32,
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_BUDGET)
    }
}

impl RetryBudget {
    /// Creates a budget absorbing up to `max_retries` failures.
    #[must_use]
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            used: 0,
        }
    }

    /// Maximum number of failures the download may absorb.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Failures recorded so far.
    #[must_use]
    pub fn used(&self) -> u32 {
        self.used
    }

    /// Records one failure and decides whether the download may go on.
    pub fn record_failure(&mut self) -> RetryDecision {
        self.used = self.used.saturating_add(1);

        if self.used > self.max_retries {
            debug!(used = self.used, max = self.max_retries, "retry budget exhausted");
            return RetryDecision::Exhausted {
                reason: format!(
                    "{} chunk failures exceed the budget of {}",
                    self.used, self.max_retries
                ),
            };
        }

        RetryDecision::Retry { attempt: self.used }
    }
}
