// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Application state wiring.
//!
//! Every service is constructed once at startup and passed down explicitly;
//! there is no hidden global state.

use crate::env::Settings;
use joule_core::ProgressSink;
use joule_engine::{JobRegistry, ProgressBus, SupervisorConfig, WorkerSupervisor};
use joule_storage::{ArtifactStore, ResultDiscovery, TtlCache};
use std::sync::Arc;
use std::time::Instant;

/// Shared handles for all request handlers and background tasks.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub registry: Arc<JobRegistry>,
    pub bus: Arc<ProgressBus>,
    pub supervisor: Arc<WorkerSupervisor>,
    pub cache: Arc<TtlCache>,
    pub store: Arc<ArtifactStore>,
    pub discovery: Arc<ResultDiscovery>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let registry = Arc::new(JobRegistry::new());
        let bus = Arc::new(ProgressBus::default());
        let supervisor = Arc::new(WorkerSupervisor::new(
            Arc::clone(&registry),
            Arc::clone(&bus) as Arc<dyn ProgressSink>,
            SupervisorConfig { max_workers: settings.worker_cap, kill_grace: settings.kill_grace },
        ));
        let store = Arc::new(ArtifactStore::new(&settings.project_root));
        let discovery = Arc::new(ResultDiscovery::new(Arc::clone(&store)));

        Self {
            settings: Arc::new(settings),
            registry,
            bus,
            supervisor,
            cache: Arc::new(TtlCache::new()),
            store,
            discovery,
            started_at: Instant::now(),
        }
    }
}
