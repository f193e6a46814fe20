// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job record and state machine.

use crate::id::JobId;
use crate::kind::JobKind;
use crate::status::JobStatus;
use serde::{Deserialize, Serialize};

/// Submission, start, and end timestamps (epoch milliseconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTimings {
    pub submitted_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    /// Completion, failure, or cancellation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at_ms: Option<u64>,
}

impl JobTimings {
    pub fn new(submitted_at_ms: u64) -> Self {
        Self { submitted_at_ms, started_at_ms: None, finished_at_ms: None }
    }
}

/// Fields a worker progress event may update on a running job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub progress: Option<u8>,
    pub step: Option<String>,
    pub status: Option<String>,
    pub sector: Option<String>,
}

/// One user-submitted analytical request with a lifecycle.
///
/// The config is immutable after creation. In terminal states exactly one of
/// `result` and `error` is populated for `completed`/`failed`; `cancelled`
/// populates neither.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub kind: JobKind,
    pub status: JobStatus,
    /// 0..=100; monotonic non-decreasing while running, frozen on
    /// failure/cancellation, 100 on completion.
    pub progress: u8,
    pub config: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_details: Option<String>,
    pub timings: JobTimings,
}

impl Job {
    /// Create a freshly submitted job in `queued`.
    pub fn new(id: JobId, kind: JobKind, config: serde_json::Value, submitted_at_ms: u64) -> Self {
        Self {
            id,
            kind,
            status: JobStatus::Queued,
            progress: 0,
            config,
            result: None,
            error: None,
            current_step: None,
            status_details: None,
            timings: JobTimings::new(submitted_at_ms),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Room carrying this job's progress events.
    pub fn room(&self) -> String {
        self.kind.room(&self.id)
    }

    /// Transition `queued → running`. Returns false if not permitted.
    pub fn start(&mut self, now_ms: u64) -> bool {
        if !self.status.can_transition(JobStatus::Running) {
            return false;
        }
        self.status = JobStatus::Running;
        self.timings.started_at_ms = Some(now_ms);
        true
    }

    /// Apply a worker progress report. Only valid while running; progress is
    /// clamped so it never decreases.
    pub fn record_progress(&mut self, update: ProgressUpdate) -> bool {
        if self.status != JobStatus::Running {
            return false;
        }
        if let Some(p) = update.progress {
            self.progress = self.progress.max(p.min(100));
        }
        if update.step.is_some() {
            self.current_step = update.step;
        }
        match (update.status, update.sector) {
            (Some(status), _) => self.status_details = Some(status),
            (None, Some(sector)) => self.status_details = Some(format!("sector {sector}")),
            (None, None) => {}
        }
        true
    }

    /// Transition to `completed`, recording the result and forcing progress
    /// to 100. Returns false if not permitted.
    pub fn complete(&mut self, result: serde_json::Value, now_ms: u64) -> bool {
        if !self.status.can_transition(JobStatus::Completed) {
            return false;
        }
        self.status = JobStatus::Completed;
        self.progress = 100;
        self.result = Some(result);
        self.timings.finished_at_ms = Some(now_ms);
        true
    }

    /// Transition to `failed`, recording the error. Progress stays frozen at
    /// its last observed value. Returns false if not permitted.
    pub fn fail(&mut self, error: impl Into<String>, now_ms: u64) -> bool {
        if !self.status.can_transition(JobStatus::Failed) {
            return false;
        }
        self.status = JobStatus::Failed;
        self.error = Some(error.into());
        self.timings.finished_at_ms = Some(now_ms);
        true
    }

    /// Transition to `cancelled`. Neither result nor error is populated.
    /// Returns false if not permitted.
    pub fn cancel(&mut self, now_ms: u64) -> bool {
        if !self.status.can_transition(JobStatus::Cancelled) {
            return false;
        }
        self.status = JobStatus::Cancelled;
        self.timings.finished_at_ms = Some(now_ms);
        true
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        into {
            id: JobId = "fct-test000000000000000",
        }
        set {
            kind: JobKind = JobKind::Forecast,
            status: JobStatus = JobStatus::Queued,
            progress: u8 = 0,
            config: serde_json::Value = serde_json::Value::Null,
            timings: JobTimings = JobTimings::new(1_000_000),
        }
        option {
            result: serde_json::Value = None,
            error: String = None,
            current_step: String = None,
            status_details: String = None,
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
