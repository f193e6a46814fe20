// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job registry: the source of truth for job state.
//!
//! The registry never spawns or kills processes; the supervisor drives
//! transitions through the methods here. Invalid transitions (completing a
//! cancelled job, cancelling a completed one) are no-ops that return false.

use indexmap::IndexMap;
use joule_core::{Clock, Job, JobId, JobKind, JobStatus, ProgressUpdate, SystemClock};
use parking_lot::RwLock;
use serde::Serialize;

/// Trimmed job view for listings; large payloads (config, result) stay out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSummary {
    pub id: JobId,
    pub kind: JobKind,
    pub status: JobStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub submitted_at_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at_ms: Option<u64>,
}

impl From<&Job> for JobSummary {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.clone(),
            kind: job.kind,
            status: job.status,
            progress: job.progress,
            current_step: job.current_step.clone(),
            error: job.error.clone(),
            submitted_at_ms: job.timings.submitted_at_ms,
            finished_at_ms: job.timings.finished_at_ms,
        }
    }
}

/// Job totals by status, for the health endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryCounts {
    pub queued: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

/// Per-kind table of jobs in insertion order.
///
/// Readers take snapshots (clones) under a read lock, so they never observe
/// a torn job; writers serialize on the write lock.
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<IndexMap<JobId, Job>>,
}

fn epoch_ms_now() -> u64 {
    SystemClock.epoch_ms()
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint an id and store a new job in `queued`.
    pub fn create(&self, kind: JobKind, config: serde_json::Value) -> JobId {
        let id = JobId::mint(kind);
        let job = Job::new(id.clone(), kind, config, epoch_ms_now());
        self.jobs.write().insert(id.clone(), job);
        id
    }

    /// Consistent snapshot of one job.
    pub fn get(&self, id: &str) -> Option<Job> {
        self.jobs.read().get(id).cloned()
    }

    /// All jobs of a kind, in insertion order, trimmed to summary fields.
    pub fn list(&self, kind: JobKind) -> Vec<JobSummary> {
        self.jobs.read().values().filter(|j| j.kind == kind).map(JobSummary::from).collect()
    }

    /// Job totals by status across all kinds.
    pub fn counts(&self) -> RegistryCounts {
        let mut counts = RegistryCounts::default();
        for job in self.jobs.read().values() {
            match job.status {
                JobStatus::Queued => counts.queued += 1,
                JobStatus::Running => counts.running += 1,
                JobStatus::Completed => counts.completed += 1,
                JobStatus::Failed => counts.failed += 1,
                JobStatus::Cancelled => counts.cancelled += 1,
            }
        }
        counts
    }

    pub fn transition_running(&self, id: &str) -> bool {
        self.with_job(id, |job| job.start(epoch_ms_now()))
    }

    pub fn update_progress(&self, id: &str, update: ProgressUpdate) -> bool {
        self.with_job(id, |job| job.record_progress(update))
    }

    pub fn complete(&self, id: &str, result: serde_json::Value) -> bool {
        self.with_job(id, |job| job.complete(result, epoch_ms_now()))
    }

    pub fn fail(&self, id: &str, error: &str) -> bool {
        self.with_job(id, |job| job.fail(error, epoch_ms_now()))
    }

    pub fn mark_cancelled(&self, id: &str) -> bool {
        self.with_job(id, |job| job.cancel(epoch_ms_now()))
    }

    fn with_job(&self, id: &str, f: impl FnOnce(&mut Job) -> bool) -> bool {
        match self.jobs.write().get_mut(id) {
            Some(job) => f(job),
            None => false,
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
