// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the workspace specs.

// Not every spec module uses every fixture.
#![allow(dead_code)]

use joule_server::{router, AppState, Settings};
use std::net::SocketAddr;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::{Duration, Instant};

pub const SPEC_WAIT: Duration = Duration::from_secs(10);

/// A forecast worker that reports progress twice and finishes with a result.
pub const HAPPY_FORECAST: &str = r#"#!/bin/sh
echo '{"type":"progress","progress":30,"step":"load"}'
echo '{"type":"progress","progress":80,"step":"fit"}'
echo '{"type":"result","scenario":"base","forecast":{"2030":412.5}}'
"#;

/// A worker that never finishes on its own.
pub const SLEEPER: &str = "#!/bin/sh\nexec sleep 10\n";

/// A profile worker that saves under the id it reports.
pub const PROFILE_WORKER: &str = r#"#!/bin/sh
echo '{"type":"progress","progress":50,"step":"generate"}'
echo '{"type":"result","profile_id":"evening_peak","method":"base_scaling","years_generated":[2025,2026],"statistics":{"peak_load":812.0},"data":{"2025":[1.0,2.0]}}'
"#;

/// An extraction-style worker: one result, regardless of the action argument.
pub const EXTRACTOR: &str = r#"#!/bin/sh
echo '{"type":"result","rows":[1,2,3]}'
"#;

/// One running server on an ephemeral port, with its own project tree.
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: AppState,
    pub project: tempfile::TempDir,
    pub client: reqwest::Client,
}

/// Builder over the three fake workers and the timing knobs.
pub struct ServerBuilder {
    forecast: String,
    profile: String,
    pypsa: String,
    forecast_timeout: Duration,
    cache_ttl: Duration,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self {
            forecast: HAPPY_FORECAST.to_string(),
            profile: PROFILE_WORKER.to_string(),
            pypsa: SLEEPER.to_string(),
            forecast_timeout: Duration::from_secs(30),
            cache_ttl: Duration::from_millis(300),
        }
    }
}

impl ServerBuilder {
    pub fn forecast_worker(mut self, script: &str) -> Self {
        self.forecast = script.to_string();
        self
    }

    pub fn profile_worker(mut self, script: &str) -> Self {
        self.profile = script.to_string();
        self
    }

    pub fn pypsa_worker(mut self, script: &str) -> Self {
        self.pypsa = script.to_string();
        self
    }

    pub fn forecast_timeout(mut self, timeout: Duration) -> Self {
        self.forecast_timeout = timeout;
        self
    }

    pub async fn start(self) -> TestServer {
        let project = tempfile::tempdir().unwrap();
        let workers = project.path().join("workers");
        std::fs::create_dir_all(&workers).unwrap();
        write_script(&workers.join("forecast-worker"), &self.forecast);
        write_script(&workers.join("profile-worker"), &self.profile);
        write_script(&workers.join("pypsa-worker"), &self.pypsa);

        let settings = Settings {
            project_root: project.path().to_path_buf(),
            http_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            worker_cap: 4,
            kill_grace: Duration::from_millis(300),
            forecast_timeout: self.forecast_timeout,
            profile_timeout: Duration::from_secs(30),
            pypsa_timeout: Duration::from_secs(30),
            oneshot_timeout: Duration::from_secs(10),
            cache_ttl: self.cache_ttl,
            cache_sweep: Duration::from_secs(60),
            forecast_worker: workers.join("forecast-worker"),
            profile_worker: workers.join("profile-worker"),
            pypsa_worker: workers.join("pypsa-worker"),
        };

        let state = AppState::new(settings);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        TestServer { addr, state, project, client: reqwest::Client::new() }
    }
}

impl TestServer {
    pub async fn start_default() -> Self {
        ServerBuilder::default().start().await
    }

    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    pub async fn post(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.client.post(self.url(path)).json(body).send().await.unwrap()
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.client.delete(self.url(path)).send().await.unwrap()
    }

    /// Poll a status endpoint until the job reaches `want` (or panic).
    pub async fn wait_for_status(&self, status_path: &str, want: &str) -> serde_json::Value {
        let deadline = Instant::now() + SPEC_WAIT;
        loop {
            let snapshot: serde_json::Value =
                self.get(status_path).await.json().await.unwrap();
            if snapshot["status"] == want {
                return snapshot;
            }
            assert!(
                Instant::now() < deadline,
                "timed out waiting for {want} at {status_path}; last: {snapshot}"
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

fn write_script(path: &Path, body: &str) {
    std::fs::write(path, body).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

/// Poll until `check` passes (or panic after `SPEC_WAIT`).
pub async fn wait_for(what: &str, mut check: impl FnMut() -> bool) {
    let deadline = Instant::now() + SPEC_WAIT;
    while !check() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
