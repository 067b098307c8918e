//! Batch outcome counters

use serde::Serialize;
use std::fmt;

/// What one dispatcher run did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Open tasks returned by the poll
    pub seen: usize,
    /// Tasks this run moved to InProgress
    pub claimed: usize,
    pub completed: usize,
    pub failed: usize,
    /// Tasks claimed elsewhere first, or unreadable
    pub skipped: usize,
    /// Expired leases failed at the start of the run
    pub recovered: usize,
    /// Errors recorded against tasks during this run
    pub error_count: usize,
}

impl BatchSummary {
    /// True iff every task completed with zero accumulated errors.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.error_count == 0
    }

    pub fn is_empty(&self) -> bool {
        self.seen == 0 && self.recovered == 0
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} seen, {} claimed, {} completed, {} failed, {} skipped, {} recovered",
            self.seen, self.claimed, self.completed, self.failed, self.skipped, self.recovered
        )
    }
}
