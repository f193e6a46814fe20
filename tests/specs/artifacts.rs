// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact flows: saved profiles, discovery, comparison, extraction.

use crate::prelude::*;
use serde_json::json;

async fn generate_profile(server: &TestServer) -> String {
    let body: serde_json::Value = server
        .post(
            "/loadprofile/generate",
            &json!({
                "method": "base_scaling",
                "start_year": 2025,
                "end_year": 2026,
                "base_year": 2023
            }),
        )
        .await
        .json()
        .await
        .unwrap();
    let job_id = body["job_id"].as_str().unwrap().to_string();
    server
        .wait_for_status(&format!("/loadprofile/jobs/{job_id}/status"), "completed")
        .await;
    job_id
}

#[tokio::test]
async fn completed_profile_lands_on_disk_and_in_listings() {
    let server = TestServer::start_default().await;
    generate_profile(&server).await;

    // The worker reported profile_id "evening_peak"; the result writer saved
    // it under the project tree.
    let saved = server
        .project
        .path()
        .join("results/load_profiles/evening_peak.json");
    assert!(saved.is_file());

    let profiles: Vec<serde_json::Value> =
        server.get("/loadprofile/profiles").await.json().await.unwrap();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0]["profile_id"], "evening_peak");
    assert_eq!(profiles[0]["method"], "base_scaling");
    assert_eq!(profiles[0]["summary"]["peak_load"], 812.0);

    let profile: serde_json::Value = server
        .get("/loadprofile/profiles/evening_peak")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(profile["years_generated"], json!([2025, 2026]));
}

#[tokio::test]
async fn deleted_profile_disappears_everywhere() {
    let server = TestServer::start_default().await;
    generate_profile(&server).await;

    let response = server.delete("/loadprofile/profiles/evening_peak").await;
    assert_eq!(response.status(), 200);

    let missing = server.get("/loadprofile/profiles/evening_peak").await;
    assert_eq!(missing.status(), 404);
    let profiles: Vec<serde_json::Value> =
        server.get("/loadprofile/profiles").await.json().await.unwrap();
    assert!(profiles.is_empty());

    // Deletion is idempotent at the store level; a second delete still
    // reports success.
    let again = server.delete("/loadprofile/profiles/evening_peak").await;
    assert_eq!(again.status(), 200);
}

#[tokio::test]
async fn compare_reads_saved_summaries() {
    let server = TestServer::start_default().await;
    generate_profile(&server).await;

    // A second profile, written directly into the project tree.
    server
        .state
        .store
        .save_json(
            "results/load_profiles/flat_base.json",
            &json!({
                "profile_id": "flat_base",
                "method": "statistical_sampling",
                "statistics": {"peak_load": 400.0},
                "data": {"2025": [1.0]}
            }),
        )
        .unwrap();

    let response = server
        .post(
            "/loadprofile/compare",
            &json!({ "profile_ids": ["evening_peak", "flat_base"] }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    let profiles = body["profiles"].as_array().unwrap();
    assert_eq!(profiles.len(), 2);
    assert_eq!(profiles[0]["summary"]["peak_load"], 812.0);
    assert_eq!(profiles[1]["summary"]["peak_load"], 400.0);
}

#[tokio::test]
async fn compare_rejects_single_and_unknown_ids() {
    let server = TestServer::start_default().await;

    let single = server
        .post("/loadprofile/compare", &json!({ "profile_ids": ["only_one"] }))
        .await;
    assert_eq!(single.status(), 400);

    let unknown = server
        .post("/loadprofile/compare", &json!({ "profile_ids": ["nope", "also_nope"] }))
        .await;
    assert_eq!(unknown.status(), 404);
}

#[tokio::test]
async fn networks_lists_solved_scenarios_only() {
    let server = TestServer::start_default().await;

    let solved = server.project.path().join("results/pypsa/grid2030");
    std::fs::create_dir_all(&solved).unwrap();
    std::fs::write(solved.join("grid2030.nc"), b"netcdf").unwrap();
    let pending = server.project.path().join("results/pypsa/draft");
    std::fs::create_dir_all(&pending).unwrap();

    let networks: Vec<serde_json::Value> =
        server.get("/pypsa/networks").await.json().await.unwrap();
    assert_eq!(networks.len(), 1);
    assert_eq!(networks[0]["scenario_name"], "grid2030");
    assert_eq!(networks[0]["size_bytes"], 6);
}

#[tokio::test]
async fn extract_results_runs_once_then_serves_from_cache() {
    let server = TestServer::builder().pypsa_worker(EXTRACTOR).start().await;

    let solved = server.project.path().join("results/pypsa/grid2030");
    std::fs::create_dir_all(&solved).unwrap();
    std::fs::write(solved.join("grid2030.nc"), b"netcdf").unwrap();

    let first: serde_json::Value = server
        .post("/pypsa/extract-results", &json!({ "scenario_name": "grid2030" }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(first["source"], "script");
    assert_eq!(first["data"]["rows"], json!([1, 2, 3]));

    let second: serde_json::Value = server
        .post("/pypsa/extract-results", &json!({ "scenario_name": "grid2030" }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(second["source"], "cache");
}

#[tokio::test]
async fn extract_results_for_unknown_scenario_is_404() {
    let server = TestServer::start_default().await;
    let response = server
        .post("/pypsa/extract-results", &json!({ "scenario_name": "missing" }))
        .await;
    assert_eq!(response.status(), 404);
}
