use std::fmt;

use crate::database::StoreStatus;

/// Counters for the current run
///
/// Always derived from the store, never accumulated on the side, so a
/// resumed run starts from the right numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressTracker {
    pub total: u64,
    pub remaining: u64,
    pub done: u64,
}

impl ProgressTracker {
    pub fn from_status(status: StoreStatus) -> Self {
        let mut tracker = Self::default();
        tracker.update(status);
        tracker
    }

    /// Refresh from fresh store counts; returns how many rows moved to done
    pub fn update(&mut self, status: StoreStatus) -> u64 {
        let before = self.done;
        self.total = status.total;
        self.remaining = status.pending;
        self.done = status.done();
        self.done.saturating_sub(before)
    }

    /// `done * 100 / total`, integer division
    pub fn percent(&self) -> u64 {
        if self.total == 0 {
            return 100;
        }
        self.done * 100 / self.total
    }

    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }
}

impl fmt::Display for ProgressTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} translated ({}%), {} remaining",
            self.done,
            self.total,
            self.percent(),
            self.remaining
        )
    }
}
