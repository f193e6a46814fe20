// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon.

use joule_core::JobKind;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Resolved daemon configuration. Everything has a default; the environment
/// overrides field by field.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base directory for the artifact store (`JOULE_PROJECT_ROOT`).
    pub project_root: PathBuf,
    /// HTTP bind address (`JOULE_HTTP_ADDR`).
    pub http_addr: SocketAddr,
    /// Concurrent worker cap (`JOULE_WORKER_CAP`, default: CPU count).
    pub worker_cap: usize,
    /// Grace between SIGTERM and SIGKILL (`JOULE_KILL_GRACE_MS`).
    pub kill_grace: Duration,
    /// Per-kind worker deadlines (`JOULE_<KIND>_TIMEOUT_SECS`).
    pub forecast_timeout: Duration,
    pub profile_timeout: Duration,
    pub pypsa_timeout: Duration,
    /// Deadline for synchronous extraction one-shots (`JOULE_ONESHOT_TIMEOUT_SECS`).
    pub oneshot_timeout: Duration,
    /// Default TTL for cached derived data (`JOULE_CACHE_TTL_SECS`).
    pub cache_ttl: Duration,
    /// Cache sweeper interval (`JOULE_CACHE_SWEEP_SECS`).
    pub cache_sweep: Duration,
    /// Per-kind worker executables (`JOULE_<KIND>_WORKER`).
    pub forecast_worker: PathBuf,
    pub profile_worker: PathBuf,
    pub pypsa_worker: PathBuf,
}

impl Settings {
    /// Read settings from the environment, applying defaults.
    pub fn from_env() -> Self {
        Self {
            project_root: path_var("JOULE_PROJECT_ROOT", "./project"),
            http_addr: addr_var("JOULE_HTTP_ADDR"),
            worker_cap: usize_var("JOULE_WORKER_CAP").unwrap_or_else(num_cpus::get).max(1),
            kill_grace: ms_var("JOULE_KILL_GRACE_MS", 3_000),
            forecast_timeout: secs_var("JOULE_FORECAST_TIMEOUT_SECS", 600),
            profile_timeout: secs_var("JOULE_PROFILE_TIMEOUT_SECS", 900),
            pypsa_timeout: secs_var("JOULE_PYPSA_TIMEOUT_SECS", 3_600),
            oneshot_timeout: secs_var("JOULE_ONESHOT_TIMEOUT_SECS", 60),
            cache_ttl: secs_var("JOULE_CACHE_TTL_SECS", 300),
            cache_sweep: secs_var("JOULE_CACHE_SWEEP_SECS", 60),
            forecast_worker: path_var("JOULE_FORECAST_WORKER", "workers/forecast-worker"),
            profile_worker: path_var("JOULE_PROFILE_WORKER", "workers/profile-worker"),
            pypsa_worker: path_var("JOULE_PYPSA_WORKER", "workers/pypsa-worker"),
        }
    }

    /// Executable for a kind's compute worker.
    pub fn worker_program(&self, kind: JobKind) -> &PathBuf {
        match kind {
            JobKind::Forecast => &self.forecast_worker,
            JobKind::Profile => &self.profile_worker,
            JobKind::Pypsa => &self.pypsa_worker,
        }
    }

    /// Default deadline for a kind's worker runs.
    pub fn default_timeout(&self, kind: JobKind) -> Duration {
        match kind {
            JobKind::Forecast => self.forecast_timeout,
            JobKind::Profile => self.profile_timeout,
            JobKind::Pypsa => self.pypsa_timeout,
        }
    }
}

fn path_var(name: &str, default: &str) -> PathBuf {
    std::env::var(name).map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(default))
}

fn addr_var(name: &str) -> SocketAddr {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8817)))
}

fn usize_var(name: &str) -> Option<usize> {
    std::env::var(name).ok().and_then(|s| s.parse::<usize>().ok())
}

fn secs_var(name: &str, default: u64) -> Duration {
    Duration::from_secs(
        std::env::var(name).ok().and_then(|s| s.parse::<u64>().ok()).unwrap_or(default),
    )
}

fn ms_var(name: &str, default: u64) -> Duration {
    Duration::from_millis(
        std::env::var(name).ok().and_then(|s| s.parse::<u64>().ok()).unwrap_or(default),
    )
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
