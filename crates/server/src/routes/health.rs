// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Liveness and basic process stats.

use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use joule_engine::RegistryCounts;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub success: bool,
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub jobs: RegistryCounts,
    pub workers: WorkerStats,
}

#[derive(Debug, Serialize)]
pub(crate) struct WorkerStats {
    pub cap: usize,
    pub in_flight: usize,
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs(),
        jobs: state.registry.counts(),
        workers: WorkerStats {
            cap: state.supervisor.max_workers(),
            in_flight: state.supervisor.in_flight(),
        },
    })
}
