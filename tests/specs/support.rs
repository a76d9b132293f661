//! Shared test-app builder for the `specs` integration suite.

use loadtest_adapters::SimulatedWorker;
use loadtest_core::test_support::test_spec;
use loadtest_core::{Spec, SpecId, SystemClock};
use loadtest_daemon::state::AppState;
use loadtest_engine::{EventBus, Orchestrator, OrchestratorConfig, StaticSpecResolver};
use loadtest_storage::InMemoryRunStore;
use std::sync::Arc;
use std::time::Duration;

/// Builds an `AppState` wired the way `main.rs` does, but with a fast
/// simulated worker tick and a small `max_workers` so tests don't block on
/// real wall-clock load-test durations.
pub fn test_state(max_workers: usize, tick: Duration) -> AppState {
    let clock = SystemClock;
    let store = Arc::new(InMemoryRunStore::new());
    let bus = Arc::new(EventBus::new(256, 30_000, clock.clone()));
    let factory = Arc::new(SimulatedWorker::with_tick(tick));
    let resolver = Arc::new(StaticSpecResolver::new());
    let config = OrchestratorConfig {
        max_workers,
        worker_timeout: Duration::from_secs(300),
        kill_grace: Duration::from_millis(200),
    };
    let orchestrator = Arc::new(Orchestrator::new(
        config,
        factory,
        Arc::clone(&resolver),
        Arc::clone(&store),
        Arc::clone(&bus),
        clock,
    ));
    AppState { orchestrator, store, bus, resolver }
}

/// Inserts a short-lived spec (one ramp-up-free second of one user) into the
/// state's resolver and returns its id.
pub fn insert_quick_spec(state: &AppState, name: &str) -> SpecId {
    let spec = test_spec(name, 1, 1);
    let id = spec.id;
    state.resolver.insert(spec);
    id
}

pub fn insert_spec(state: &AppState, spec: Spec) -> SpecId {
    let id = spec.id;
    state.resolver.insert(spec);
    id
}
