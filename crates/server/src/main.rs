// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! jouled: the Joule orchestration daemon.

use joule_server::{router, AppState, Settings};
use joule_storage::layout;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("jouled: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env();
    let _log_guard = init_tracing(&settings)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        project_root = %settings.project_root.display(),
        worker_cap = settings.worker_cap,
        "jouled starting"
    );

    let state = AppState::new(settings.clone());

    let shutdown = CancellationToken::new();
    let sweeper = state.cache.spawn_sweeper(settings.cache_sweep, shutdown.clone());

    let listener = tokio::net::TcpListener::bind(settings.http_addr).await?;
    info!(addr = %settings.http_addr, "listening");

    let supervisor = state.supervisor.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop background work before exiting: signal running workers and let
    // the sweeper wind down.
    info!("shutting down");
    supervisor.cancel_all();
    shutdown.cancel();
    let _ = sweeper.await;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

/// Stderr logging plus a daily-rolling file under `<projectRoot>/logs/`.
fn init_tracing(
    settings: &Settings,
) -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn std::error::Error>> {
    let logs_dir = settings.project_root.join(layout::LOGS_DIR);
    std::fs::create_dir_all(&logs_dir)?;
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(logs_dir, "jouled.log"));

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("JOULE_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();
    Ok(guard)
}
