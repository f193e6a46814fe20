// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Surface-level API specs: validation, lookups, health, listings.

use crate::prelude::*;
use serde_json::json;

#[tokio::test]
async fn health_reports_process_stats() {
    let server = TestServer::start_default().await;
    let response = server.get("/health").await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "ok");
    assert!(body["uptime_secs"].as_u64().is_some());
    assert_eq!(body["jobs"]["running"], 0);
    assert_eq!(body["workers"]["cap"], 4);
}

#[tokio::test]
async fn invalid_forecast_config_returns_400_with_errors() {
    let server = TestServer::start_default().await;
    let response = server
        .post(
            "/demand/forecast",
            &json!({
                "scenario_name": "bad scenario!",
                "target_year": 1999,
                "sectors": {}
            }),
        )
        .await;
    assert_eq!(response.status(), 400);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 3, "{errors:?}");
    // Nothing was submitted.
    let jobs: Vec<serde_json::Value> =
        server.get("/demand/forecast/jobs").await.json().await.unwrap();
    assert!(jobs.is_empty());
}

#[tokio::test]
async fn structurally_bad_body_gets_the_same_error_shape() {
    let server = TestServer::start_default().await;
    let response = server.post("/demand/forecast", &json!(42)).await;
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(
        body["errors"][0].as_str().unwrap().contains("invalid forecast config"),
        "{body}"
    );
}

#[tokio::test]
async fn unknown_job_status_is_404() {
    let server = TestServer::start_default().await;
    let response = server.get("/demand/forecast/fct-nope/status").await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn status_endpoints_are_kind_scoped() {
    let server = TestServer::start_default().await;
    let body: serde_json::Value = server
        .post(
            "/demand/forecast",
            &json!({
                "scenario_name": "base",
                "target_year": 2030,
                "sectors": {"residential": {"models": ["SLR"]}}
            }),
        )
        .await
        .json()
        .await
        .unwrap();
    let job_id = body["job_id"].as_str().unwrap();

    // A forecast id does not answer on the optimization surface.
    let response = server.get(&format!("/pypsa/optimization/{job_id}/status")).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn cancel_of_completed_job_is_conflict_not_missing() {
    let server = TestServer::start_default().await;
    let body: serde_json::Value = server
        .post(
            "/demand/forecast",
            &json!({
                "scenario_name": "base",
                "target_year": 2030,
                "sectors": {"residential": {"models": ["SLR"]}}
            }),
        )
        .await
        .json()
        .await
        .unwrap();
    let job_id = body["job_id"].as_str().unwrap().to_string();

    server
        .wait_for_status(&format!("/demand/forecast/{job_id}/status"), "completed")
        .await;

    let response = server
        .post(&format!("/demand/forecast/{job_id}/cancel"), &json!({}))
        .await;
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(
        body["errors"][0].as_str().unwrap().contains("completed"),
        "{body}"
    );
}

#[tokio::test]
async fn cancel_of_unknown_job_is_404() {
    let server = TestServer::start_default().await;
    let response = server.post("/pypsa/optimization/psa-nope/cancel", &json!({})).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn listings_keep_submission_order() {
    let server = TestServer::start_default().await;
    let mut submitted = Vec::new();
    for scenario in ["first", "second", "third"] {
        let body: serde_json::Value = server
            .post(
                "/demand/forecast",
                &json!({
                    "scenario_name": scenario,
                    "target_year": 2030,
                    "sectors": {"residential": {"models": ["SLR"]}}
                }),
            )
            .await
            .json()
            .await
            .unwrap();
        submitted.push(body["job_id"].as_str().unwrap().to_string());
    }

    let listed: Vec<serde_json::Value> =
        server.get("/demand/forecast/jobs").await.json().await.unwrap();
    let ids: Vec<&str> = listed.iter().map(|j| j["id"].as_str().unwrap()).collect();
    assert_eq!(ids, submitted);
    // Summaries stay trimmed.
    assert!(listed[0].get("config").is_none());
    assert!(listed[0].get("result").is_none());
}

#[tokio::test]
async fn profile_validation_catches_method_rules() {
    let server = TestServer::start_default().await;
    let response = server
        .post(
            "/loadprofile/generate",
            &json!({
                "method": "base_scaling",
                "start_year": 2025,
                "end_year": 2030
            }),
        )
        .await;
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["errors"][0].as_str().unwrap().contains("base_year"), "{body}");
}

#[tokio::test]
async fn pypsa_validation_checks_solver() {
    let server = TestServer::start_default().await;
    let response = server
        .post(
            "/pypsa/optimize",
            &json!({
                "scenario_name": "grid2030",
                "base_year": 2025,
                "investment_mode": "single_year",
                "solver": {"name": "cplex", "time_limit_secs": 0}
            }),
        )
        .await;
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    let text = body["errors"].to_string();
    assert!(text.contains("solver"), "{text}");
    assert!(text.contains("time_limit_secs"), "{text}");
}
