// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job lifecycle status.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a job.
///
/// Transitions are monotonic and one-way:
/// `queued → running → {completed | failed | cancelled}`.
/// A queued job may also fail (spawn error) or be cancelled before it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Terminal states are final; no transition leaves them.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled)
    }

    /// Whether the one-way lattice permits moving from `self` to `to`.
    pub fn can_transition(self, to: JobStatus) -> bool {
        match self {
            JobStatus::Queued => matches!(
                to,
                JobStatus::Running | JobStatus::Failed | JobStatus::Cancelled
            ),
            JobStatus::Running => to.is_terminal(),
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled => false,
        }
    }
}

crate::simple_display! {
    JobStatus {
        Queued => "queued",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
