// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor error and outcome types.

use thiserror::Error;

/// Terminal outcome of one worker run.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerOutcome {
    /// Worker exited 0 and emitted a result line.
    Completed(serde_json::Value),
    /// Worker failed; the string is the job's error (stderr, timeout note,
    /// or a classification message).
    Failed(String),
    /// Run was cancelled; neither result nor error applies.
    Cancelled,
}

/// Errors surfaced by the worker supervisor.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// A live worker handle already exists for this job. At most one worker
    /// serves a job at any moment.
    #[error("job {0} already has a live worker")]
    AlreadyRunning(String),

    #[error("unknown job: {0}")]
    UnknownJob(String),

    #[error("worker failed: {0}")]
    Worker(String),

    #[error("worker timed out")]
    Timeout,

    #[error("failed to spawn worker: {0}")]
    Spawn(#[from] std::io::Error),
}
