// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Load-profile endpoints: generation jobs and saved-profile management.

use crate::error::ApiError;
use crate::jobs::{self, SubmitResponse};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use joule_core::{Job, JobKind, ProfileConfig};
use joule_engine::JobSummary;
use joule_storage::{layout, ProfileMeta};

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/generate", post(generate))
        .route("/jobs", get(list_jobs))
        .route("/jobs/:id/status", get(status))
        .route("/jobs/:id/cancel", post(cancel))
        .route("/profiles", get(list_profiles))
        .route("/profiles/:id", get(get_profile).delete(delete_profile))
        .route("/compare", post(compare))
}

/// Start a load-profile generation job. Returns `202` with the job id.
async fn generate(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let config: ProfileConfig = jobs::parse_and_validate(JobKind::Profile, &body)?;
    let job_id = jobs::submit(&state, JobKind::Profile, body, config.timeout_secs)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            success: true,
            job_id,
            message: format!("{} profile generation accepted", config.method),
        }),
    ))
}

async fn list_jobs(State(state): State<AppState>) -> Json<Vec<JobSummary>> {
    Json(state.registry.list(JobKind::Profile))
}

async fn status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Job>, ApiError> {
    jobs::job_snapshot(&state, JobKind::Profile, &id).map(Json)
}

async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<jobs::CancelResponse>, ApiError> {
    jobs::cancel_job(&state, JobKind::Profile, &id).await.map(Json)
}

/// List saved profiles. Always rescans: listings are the explicit refresh
/// point for the discovery index.
async fn list_profiles(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProfileMeta>>, ApiError> {
    Ok(Json(state.discovery.rescan_profiles()?))
}

async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    jobs::check_path_identifier("profile id", &id)?;
    let profile: serde_json::Value = state.store.read_json(&layout::profile_path(&id))?;
    Ok(Json(profile))
}

async fn delete_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    jobs::check_path_identifier("profile id", &id)?;
    state.store.delete(&layout::profile_path(&id))?;
    state.discovery.evict_profile(&id);
    Ok(Json(serde_json::json!({ "success": true, "profile_id": id })))
}

/// Side-by-side summary statistics for saved profiles.
async fn compare(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let ids = body
        .get("profile_ids")
        .and_then(|v| v.as_array())
        .ok_or_else(|| ApiError::bad_request("profile_ids must be an array of strings"))?;
    let ids: Vec<&str> = ids
        .iter()
        .map(|v| {
            v.as_str()
                .ok_or_else(|| ApiError::bad_request("profile_ids must be an array of strings"))
        })
        .collect::<Result<_, _>>()?;
    if ids.len() < 2 {
        return Err(ApiError::bad_request("compare needs at least two profile_ids"));
    }
    let mut profiles = Vec::with_capacity(ids.len());
    for id in &ids {
        jobs::check_path_identifier("profile id", id)?;
        let meta = state
            .discovery
            .profile(id)?
            .ok_or_else(|| ApiError::NotFound(format!("profile {id}")))?;
        profiles.push(serde_json::json!({
            "profile_id": meta.profile_id,
            "method": meta.method,
            "years_generated": meta.years_generated,
            "summary": meta.summary,
        }));
    }
    Ok(Json(serde_json::json!({ "success": true, "profiles": profiles })))
}
