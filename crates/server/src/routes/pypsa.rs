// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Optimization endpoints: PyPSA jobs, discovered networks, extraction.

use crate::error::ApiError;
use crate::jobs::{self, SubmitResponse};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use joule_core::{Job, JobKind, PypsaConfig};
use joule_engine::{run_oneshot, JobSummary, WorkerCommand};
use joule_storage::{layout, NetworkMeta};

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/optimize", post(optimize))
        .route("/optimizations", get(list_jobs))
        .route("/optimization/:id/status", get(status))
        .route("/optimization/:id/cancel", post(cancel))
        .route("/networks", get(networks))
        .route("/extract-results", post(extract_results))
}

/// Start an optimization job. Returns `202` with the job id.
async fn optimize(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let config: PypsaConfig = jobs::parse_and_validate(JobKind::Pypsa, &body)?;
    let job_id = jobs::submit(&state, JobKind::Pypsa, body, config.timeout_secs)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            success: true,
            job_id,
            message: format!("optimization for scenario {:?} accepted", config.scenario_name),
        }),
    ))
}

async fn list_jobs(State(state): State<AppState>) -> Json<Vec<JobSummary>> {
    Json(state.registry.list(JobKind::Pypsa))
}

async fn status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Job>, ApiError> {
    jobs::job_snapshot(&state, JobKind::Pypsa, &id).map(Json)
}

async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<jobs::CancelResponse>, ApiError> {
    jobs::cancel_job(&state, JobKind::Pypsa, &id).await.map(Json)
}

/// Discovered solved networks. Always rescans (explicit refresh point).
async fn networks(State(state): State<AppState>) -> Result<Json<Vec<NetworkMeta>>, ApiError> {
    Ok(Json(state.discovery.rescan_networks()?))
}

/// Extract summary results from a solved network, cached under the scenario.
async fn extract_results(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let scenario = body
        .get("scenario_name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ApiError::bad_request("scenario_name is required"))?;
    jobs::check_path_identifier("scenario name", scenario)?;

    let key = format!("pypsa-results:{scenario}");
    if let Some(data) = state.cache.get(&key) {
        return Ok(Json(serde_json::json!({
            "success": true,
            "source": "cache",
            "scenario_name": scenario,
            "data": data,
        })));
    }

    let network = layout::network_path(scenario);
    if !state.store.exists(&network)? {
        return Err(ApiError::NotFound(format!("network for scenario {scenario}")));
    }

    let action = serde_json::json!({
        "action": "extract_results",
        "scenario_name": scenario,
        "network_path": network,
    });
    let command = WorkerCommand::new(state.settings.worker_program(JobKind::Pypsa))
        .arg(action.to_string());
    let data = run_oneshot(&command, state.settings.oneshot_timeout)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    if let Err(e) = state.cache.set(&key, &data, Some(state.settings.cache_ttl)) {
        tracing::warn!(key = %key, error = %e, "failed to cache extraction result");
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "source": "script",
        "scenario_name": scenario,
        "data": data,
    })))
}
