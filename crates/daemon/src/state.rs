// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide shared state injected into every handler via axum's
//! typed `State` extractor. Handlers that only need the Orchestrator's public
//! API go through `orchestrator`; handlers that read run records or
//! subscribe to the event stream hold their own `Arc` to the store/bus
//! directly, per §5's resource-ownership table — the
//! Orchestrator does not re-expose either on its production surface.

use loadtest_adapters::SimulatedWorker;
use loadtest_core::SystemClock;
use loadtest_engine::{EventBus, Orchestrator, StaticSpecResolver};
use loadtest_storage::InMemoryRunStore;
use std::sync::Arc;

pub type AppOrchestrator =
    Orchestrator<SimulatedWorker, StaticSpecResolver, InMemoryRunStore, SystemClock>;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<AppOrchestrator>,
    pub store: Arc<InMemoryRunStore>,
    pub bus: Arc<EventBus<SystemClock>>,
    pub resolver: Arc<StaticSpecResolver>,
}
