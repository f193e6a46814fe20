// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events published to job rooms.

use crate::id::JobId;
use serde::{Deserialize, Serialize};

/// Category of a published event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Lifecycle note (job accepted, worker starting).
    Status,
    Progress,
    Completed,
    Cancelled,
    /// Job failed; payload carries the error string.
    Error,
}

impl EventKind {
    /// Terminal events are never dropped by subscriber overflow handling.
    pub fn is_terminal(self) -> bool {
        matches!(self, EventKind::Completed | EventKind::Cancelled | EventKind::Error)
    }
}

crate::simple_display! {
    EventKind {
        Status => "status",
        Progress => "progress",
        Completed => "completed",
        Cancelled => "cancelled",
        Error => "error",
    }
}

/// Envelope delivered to every subscriber of a job's room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEvent {
    pub job_id: JobId,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub payload: serde_json::Value,
    /// Publication time, epoch milliseconds.
    pub ts: u64,
}

impl JobEvent {
    pub fn new(job_id: JobId, kind: EventKind, payload: serde_json::Value, ts: u64) -> Self {
        Self { job_id, kind, payload, ts }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
