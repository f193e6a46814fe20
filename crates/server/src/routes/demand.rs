// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Demand endpoints: cached sector reads and forecast jobs.

use crate::error::ApiError;
use crate::jobs::{self, SubmitResponse};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use joule_core::{ForecastConfig, Job, JobKind};
use joule_engine::{run_oneshot, JobSummary, WorkerCommand};

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/sectors/:sector", get(sector_data))
        .route("/correlation/:sector", get(correlation))
        .route("/forecast", post(start_forecast))
        .route("/forecast/jobs", get(list_jobs))
        .route("/forecast/:id/status", get(status))
        .route("/forecast/:id/cancel", post(cancel))
}

/// Cached sector data, extracted by the forecast worker on a miss.
async fn sector_data(
    State(state): State<AppState>,
    Path(sector): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    cached_extraction(&state, "sector-data", &sector, "sector_data").await
}

/// Cached correlation table for one sector.
async fn correlation(
    State(state): State<AppState>,
    Path(sector): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    cached_extraction(&state, "correlation", &sector, "correlation").await
}

/// Serve from the TTL cache, falling back to a worker one-shot. Responses
/// say which side supplied the data.
async fn cached_extraction(
    state: &AppState,
    key_prefix: &str,
    sector: &str,
    action: &str,
) -> Result<Json<serde_json::Value>, ApiError> {
    jobs::check_path_identifier("sector", sector)?;

    let key = format!("{key_prefix}:{sector}");
    if let Some(data) = state.cache.get(&key) {
        return Ok(Json(serde_json::json!({
            "success": true,
            "source": "cache",
            "sector": sector,
            "data": data,
        })));
    }

    let request = serde_json::json!({ "action": action, "sector": sector });
    let command = WorkerCommand::new(state.settings.worker_program(JobKind::Forecast))
        .arg(request.to_string());
    let data = run_oneshot(&command, state.settings.oneshot_timeout)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    // A cache miss on the next read just re-runs the extraction.
    if let Err(e) = state.cache.set(&key, &data, Some(state.settings.cache_ttl)) {
        tracing::warn!(key = %key, error = %e, "failed to cache extraction result");
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "source": "script",
        "sector": sector,
        "data": data,
    })))
}

/// Start a forecast job. Returns `202` with the job id.
async fn start_forecast(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let config: ForecastConfig = jobs::parse_and_validate(JobKind::Forecast, &body)?;
    let job_id = jobs::submit(&state, JobKind::Forecast, body, config.timeout_secs)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            success: true,
            job_id,
            message: format!("forecast for scenario {:?} accepted", config.scenario_name),
        }),
    ))
}

async fn list_jobs(State(state): State<AppState>) -> Json<Vec<JobSummary>> {
    Json(state.registry.list(JobKind::Forecast))
}

async fn status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Job>, ApiError> {
    jobs::job_snapshot(&state, JobKind::Forecast, &id).map(Json)
}

async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<jobs::CancelResponse>, ApiError> {
    jobs::cancel_job(&state, JobKind::Forecast, &id).await.map(Json)
}
