// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Submission glue between HTTP handlers and the engine.

use crate::error::ApiError;
use crate::state::AppState;
use chrono::Datelike;
use joule_core::{validate, Job, JobId, JobKind, Validation};
use joule_engine::{ResultWriter, StartOptions, WorkerCommand};
use joule_storage::{layout, ArtifactStore};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Per-request timeout override bounds.
const MIN_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);

/// Body of every `202 Accepted` submission response.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub job_id: JobId,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelResponse {
    pub success: bool,
    pub job_id: JobId,
    pub message: String,
}

pub fn current_year() -> i32 {
    chrono::Utc::now().year()
}

/// Turn a validation verdict into a request error.
pub fn check(validation: Validation) -> Result<(), ApiError> {
    if validation.valid {
        Ok(())
    } else {
        Err(ApiError::BadRequest(validation.errors))
    }
}

/// Validate a raw submission body and hand back the typed config.
///
/// Deserialization problems and semantic rules both surface as the same
/// `400 {errors: [...]}` shape.
pub fn parse_and_validate<T: serde::de::DeserializeOwned>(
    kind: JobKind,
    body: &serde_json::Value,
) -> Result<T, ApiError> {
    check(validate::validate_config(kind, body, current_year()))?;
    serde_json::from_value(body.clone())
        .map_err(|e| ApiError::Internal(format!("config deserialization diverged: {e}")))
}

/// Clamp a per-request timeout override into sane bounds.
pub fn effective_timeout(default: Duration, override_secs: Option<u64>) -> Duration {
    match override_secs {
        None => default,
        Some(secs) => Duration::from_secs(secs).clamp(MIN_TIMEOUT, MAX_TIMEOUT),
    }
}

/// Create the job, build the worker invocation, and hand it to the
/// supervisor. The config value is the serialized request body; the worker
/// receives it as its single argument.
pub fn submit(
    state: &AppState,
    kind: JobKind,
    config: serde_json::Value,
    timeout_override: Option<u64>,
) -> Result<JobId, ApiError> {
    let job_id = state.registry.create(kind, config.clone());
    let command = WorkerCommand::new(state.settings.worker_program(kind)).arg(config.to_string());
    let deadline = effective_timeout(state.settings.default_timeout(kind), timeout_override);

    let mut opts = StartOptions::new(deadline);
    if kind == JobKind::Profile {
        opts = opts.with_result_writer(Arc::new(ProfileResultWriter {
            store: Arc::clone(&state.store),
        }));
    }

    state
        .supervisor
        .start(&job_id, kind, command, opts)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    tracing::info!(%job_id, %kind, "job submitted");
    Ok(job_id)
}

/// Registry snapshot for a status endpoint. The id must belong to the
/// endpoint's kind; ids of other kinds read as unknown.
pub fn job_snapshot(state: &AppState, kind: JobKind, id: &str) -> Result<Job, ApiError> {
    match state.registry.get(id) {
        Some(job) if job.kind == kind => Ok(job),
        _ => Err(ApiError::NotFound(format!("{} job {id}", kind.wire_name()))),
    }
}

/// Cancel a job: `200` only once the supervisor has confirmed the child is
/// no longer running, `400` for jobs in a non-cancellable state.
pub async fn cancel_job(
    state: &AppState,
    kind: JobKind,
    id: &str,
) -> Result<CancelResponse, ApiError> {
    let job = job_snapshot(state, kind, id)?;
    if job.is_terminal() {
        return Err(ApiError::bad_request(format!(
            "cannot cancel a job in state {}",
            job.status
        )));
    }

    let confirmed = state.supervisor.cancel(id).await;
    let job = job_snapshot(state, kind, id)?;
    match job.status {
        joule_core::JobStatus::Cancelled => Ok(CancelResponse {
            success: true,
            job_id: job.id,
            message: "job cancelled".to_string(),
        }),
        status if status.is_terminal() => Err(ApiError::bad_request(format!(
            "job finished as {status} before the cancel took effect"
        ))),
        _ if !confirmed => Err(ApiError::Internal(format!(
            "no worker handle for non-terminal job {id}"
        ))),
        status => Err(ApiError::Internal(format!(
            "worker terminated but job is still {status}"
        ))),
    }
}

/// Identifier check for anything that becomes a path component. The message
/// names the path problem so clients can tell it apart from other 400s.
pub fn check_path_identifier(what: &str, id: &str) -> Result<(), ApiError> {
    if validate::valid_identifier(id) {
        Ok(())
    } else {
        Err(ApiError::bad_request(format!(
            "invalid {what} (unsafe path characters rejected): {id:?}"
        )))
    }
}

/// Persists completed load profiles under `results/load_profiles/`.
struct ProfileResultWriter {
    store: Arc<ArtifactStore>,
}

impl ResultWriter for ProfileResultWriter {
    fn write(&self, job_id: &JobId, payload: &serde_json::Value) -> Result<(), String> {
        let profile_id = payload
            .get("profile_id")
            .and_then(|v| v.as_str())
            .unwrap_or_else(|| job_id.as_str());
        if !validate::valid_identifier(profile_id) {
            return Err(format!("worker reported an unsafe profile id: {profile_id:?}"));
        }
        self.store
            .save_json(&layout::profile_path(profile_id), payload)
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
