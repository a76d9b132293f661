// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! loadtestd — standalone control-plane server.
//!
//! Reads config from env vars (see `loadtest_daemon::config` / §6):
//!   MAX_WORKERS, WORKER_TIMEOUT_MS, TERMINAL_GRACE_MS, SUBSCRIBER_QUEUE,
//!   BIND_ADDR, STATE_DIR, RUST_LOG.

use loadtest_adapters::SimulatedWorker;
use loadtest_core::SystemClock;
use loadtest_daemon::build_router;
use loadtest_daemon::config;
use loadtest_daemon::state::AppState;
use loadtest_engine::{EventBus, Orchestrator, OrchestratorConfig, StaticSpecResolver};
use loadtest_storage::{InMemoryRunStore, RecoveryLog};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,loadtest=debug".into()),
        )
        .init();

    let state_dir = config::state_dir();
    let log = Arc::new(RecoveryLog::open(&state_dir)?);
    let store = Arc::new(InMemoryRunStore::recover(Arc::clone(&log))?);

    let clock = SystemClock;
    let bus = Arc::new(EventBus::new(
        config::subscriber_queue(),
        config::terminal_grace().as_millis() as u64,
        clock.clone(),
    ));
    let factory = Arc::new(SimulatedWorker::new());
    let resolver = Arc::new(StaticSpecResolver::new());

    let orchestrator_config = OrchestratorConfig {
        max_workers: config::max_workers(),
        worker_timeout: config::worker_timeout(),
        kill_grace: config::kill_grace(),
    };
    let orchestrator = Arc::new(Orchestrator::new(
        orchestrator_config,
        factory,
        Arc::clone(&resolver),
        Arc::clone(&store),
        Arc::clone(&bus),
        clock,
    ));

    let state = AppState { orchestrator, store, bus, resolver };
    let app = build_router(state);

    let bind_addr = config::bind_addr();
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("loadtestd listening on {bind_addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
