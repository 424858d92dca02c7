use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{DispatchStatus, EventKind};

/// What happened to one record during replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    /// Source line of the record.
    pub line: usize,
    pub kind: EventKind,
    /// Suspension applied before the record was dispatched.
    pub delay: Duration,
    pub status: DispatchStatus,
}

/// Per-record outcomes of one replay pass, plus parse diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayReport {
    pub outcomes: Vec<DispatchOutcome>,
    pub skipped_lines: Vec<usize>,
    pub parse_error: Option<String>,
    pub cancelled: bool,
}

impl ReplayReport {
    pub fn injected(&self) -> usize {
        self.count(|status| matches!(status, DispatchStatus::Injected))
    }

    pub fn failed(&self) -> usize {
        self.count(|status| matches!(status, DispatchStatus::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|status| matches!(status, DispatchStatus::Skipped(_)))
    }

    /// Sum of every suspension taken during the pass.
    pub fn total_delay(&self) -> Duration {
        self.outcomes.iter().map(|outcome| outcome.delay).sum()
    }

    fn count(&self, predicate: impl Fn(&DispatchStatus) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| predicate(&outcome.status))
            .count()
    }
}
