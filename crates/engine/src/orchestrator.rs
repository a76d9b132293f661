// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Run Orchestrator (§4.4): the top-level component. Validates the
//! referenced spec, admits under a concurrency cap, creates the run record,
//! attaches a Supervisor, and owns the single per-run event translation task
//! that turns Supervisor messages into Run Store writes and Event Bus
//! publishes.
//!
//! Admission is serialized through one `tokio::sync::Mutex` so the capacity
//! check and the run record's creation are atomic with respect to every
//! other `start_run` call — a single serialization point (§4.4, §5). The
//! live-run registry itself (`active`) is a `parking_lot::Mutex` since every
//! access to it is synchronous and brief.

use crate::error::{DeadReason, OrchestratorError};
use crate::event_bus::{EventBus, RunEvent};
use crate::resolver::{ResolveError, SpecResolver};
use crate::supervisor::{
    spawn_supervisor, SupervisorHandle, SupervisorMessage, DEFAULT_KILL_GRACE, DEFAULT_TIMEOUT,
};
use loadtest_adapters::WorkerFactory;
use loadtest_core::{Clock, RunErrorInfo, RunId, RunRecord, RunStatus, SpecId};
use loadtest_storage::RunStore;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Per-run parent channel buffer. Generous relative to `SUBSCRIBER_QUEUE`
/// since this channel is single-consumer (the translation task) and must
/// never itself become the bottleneck that makes a Supervisor's `send`
/// block the worker's own message pump.
const PARENT_CHANNEL_CAPACITY: usize = 256;

/// `startRun`/Supervisor tuning (§6 Configuration: `MAX_WORKERS`,
/// `WORKER_TIMEOUT_MS`).
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorConfig {
    pub max_workers: usize,
    pub worker_timeout: Duration,
    pub kill_grace: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self { max_workers: 4, worker_timeout: DEFAULT_TIMEOUT, kill_grace: DEFAULT_KILL_GRACE }
    }
}

/// One row of `listActive` (§4.4): derived from the in-memory Supervisor
/// registry, not the Run Store, so it reflects live process state rather
/// than records that linger until a sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveRunSummary {
    pub run_id: RunId,
    pub spec_id: SpecId,
    pub started_at_ms: u64,
    pub elapsed_seconds: u64,
}

struct ActiveRun {
    spec_id: SpecId,
    started_at_ms: u64,
    supervisor: SupervisorHandle,
    /// Flips to `true` once the per-run translation task has finished
    /// writing the terminal transition to the store and publishing the
    /// terminal event. `stopRun` waits on a fresh receiver subscribed from
    /// this sender rather than the Supervisor's own join handle, so it is
    /// synchronous with respect to the terminal *state*, not merely the
    /// child's exit (§4.4, §5). A `watch` (not a `Notify`) because any
    /// number of concurrent `stopRun`/`shutdown` callers for the same run
    /// may subscribe: each gets its own receiver, and `watch` delivers the
    /// latest value to every receiver rather than waking a single waiter.
    terminal: Arc<watch::Sender<bool>>,
}

/// The Run Orchestrator. Generic over the same three collaborator seams the
/// rest of the core is: a [`WorkerFactory`] (§4.3's single explicit spawn
/// mechanism), a [`RunStore`], and a [`Clock`], plus a [`SpecResolver`] for
/// the collaborator boundary in §4.5.
pub struct Orchestrator<W, R, S, C: Clock> {
    config: OrchestratorConfig,
    factory: Arc<W>,
    resolver: Arc<R>,
    store: Arc<S>,
    bus: Arc<EventBus<C>>,
    clock: C,
    active: Mutex<HashMap<RunId, ActiveRun>>,
    /// Serializes the capacity check and run-record creation across
    /// concurrent `start_run` callers (§4.4 admission, §5 linearizability).
    admission: tokio::sync::Mutex<()>,
}

impl<W, R, S, C> Orchestrator<W, R, S, C>
where
    W: WorkerFactory + 'static,
    R: SpecResolver + 'static,
    S: RunStore + 'static,
    C: Clock + 'static,
{
    pub fn new(
        config: OrchestratorConfig,
        factory: Arc<W>,
        resolver: Arc<R>,
        store: Arc<S>,
        bus: Arc<EventBus<C>>,
        clock: C,
    ) -> Self {
        Self {
            config,
            factory,
            resolver,
            store,
            bus,
            clock,
            active: Mutex::new(HashMap::new()),
            admission: tokio::sync::Mutex::new(()),
        }
    }

    /// `startRun` (§4.4). Requires `Arc<Self>` because the per-run
    /// translation task it spawns outlives the call and needs its own
    /// handle back to the orchestrator.
    pub async fn start_run(self: &Arc<Self>, spec_id: SpecId) -> Result<RunId, OrchestratorError> {
        let spec = self.resolver.resolve(spec_id).await.map_err(|e| match e {
            ResolveError::NotFound => OrchestratorError::SpecNotFound,
            ResolveError::Invalid(reason) => OrchestratorError::SpecInvalid(reason.to_string()),
        })?;

        // Single serialization point: from here until the run is fully
        // registered, no other start_run call can observe or change the
        // active count (§4.4, §5).
        let _admission = self.admission.lock().await;

        if self.active.lock().len() >= self.config.max_workers {
            return Err(OrchestratorError::CapacityExhausted);
        }

        let run_id = RunId::new();
        let started_at_ms = self.clock.epoch_ms();
        let record = RunRecord::new(run_id, spec_id, spec.name.clone(), started_at_ms);
        self.store.create(record).await?;
        self.bus.register(run_id);

        let (parent_tx, parent_rx) = mpsc::channel(PARENT_CHANNEL_CAPACITY);
        let supervisor = spawn_supervisor(
            self.factory.as_ref(),
            spec,
            self.config.worker_timeout,
            self.config.kill_grace,
            parent_tx,
        )
        .await;

        // The initial receiver is discarded immediately: `watch::Sender`
        // keeps its value independent of receiver count, so a later
        // `subscribe()` from `stop_run` still observes it correctly.
        let (terminal_tx, _) = watch::channel(false);
        let terminal_tx = Arc::new(terminal_tx);
        self.active.lock().insert(
            run_id,
            ActiveRun { spec_id, started_at_ms, supervisor, terminal: Arc::clone(&terminal_tx) },
        );

        self.spawn_translation_task(run_id, parent_rx, terminal_tx);

        Ok(run_id)
    }

    /// `stopRun` (§4.4). Synchronous with respect to the terminal state: it
    /// only returns once the store transition and the final event have been
    /// published.
    pub async fn stop_run(&self, run_id: RunId) -> Result<(), OrchestratorError> {
        let record = self.store.get(run_id).await.ok_or(OrchestratorError::RunNotFound)?;
        if record.status.is_terminal() {
            return Ok(());
        }

        let terminal = {
            let mut active = self.active.lock();
            active.get_mut(&run_id).map(|ar| {
                ar.supervisor.request_stop();
                // A fresh receiver per caller: `watch` replays the current
                // value to a new subscriber and wakes every receiver on
                // change, so any number of concurrent `stopRun`/`shutdown`
                // callers for this run all observe the terminal flip (unlike
                // `Notify::notify_one`, which wakes only one waiter).
                ar.terminal.subscribe()
            })
        };

        match terminal {
            Some(mut terminal_rx) => {
                let _ = terminal_rx.wait_for(|done| *done).await;
                Ok(())
            }
            // Record says running but no Supervisor is registered: an
            // orphan, most plausibly left by a process restart's sweep
            // racing a concurrent stopRun. Repair directly (§4.4).
            None => {
                let now = self.clock.epoch_ms();
                let applied = self
                    .store
                    .update_if_status(
                        run_id,
                        RunStatus::Running,
                        Box::new(move |r| {
                            r.status = RunStatus::Stopped;
                            r.completed_at_ms = Some(now);
                        }),
                    )
                    .await?;
                if applied {
                    self.bus.publish(run_id, RunEvent::Stopped);
                }
                Ok(())
            }
        }
    }

    /// `listActive` (§4.4): derived from the Supervisor registry.
    pub fn list_active(&self) -> Vec<ActiveRunSummary> {
        let now = self.clock.epoch_ms();
        self.active
            .lock()
            .iter()
            .map(|(run_id, ar)| ActiveRunSummary {
                run_id: *run_id,
                spec_id: ar.spec_id,
                started_at_ms: ar.started_at_ms,
                elapsed_seconds: now.saturating_sub(ar.started_at_ms) / 1000,
            })
            .collect()
    }

    /// Record deletion (§6 `DELETE /runs/{id}/delete`): operator-only, and
    /// only once the run has reached a terminal status (§3 lifecycle).
    pub async fn delete_run(&self, run_id: RunId) -> Result<(), OrchestratorError> {
        let record = self.store.get(run_id).await.ok_or(OrchestratorError::RunNotFound)?;
        if !record.status.is_terminal() {
            return Err(OrchestratorError::StillRunning);
        }
        self.store.delete(run_id).await?;
        Ok(())
    }

    /// `shutdown` (§4.4): stop every active run in parallel and wait for
    /// every Supervisor to reach `dead`.
    pub async fn shutdown(self: &Arc<Self>) {
        let run_ids: Vec<RunId> = self.active.lock().keys().copied().collect();
        let mut joins = Vec::with_capacity(run_ids.len());
        for run_id in run_ids {
            let this = Arc::clone(self);
            joins.push(tokio::spawn(async move {
                if let Err(e) = this.stop_run(run_id).await {
                    tracing::warn!(run_id = %run_id, error = %e, "shutdown: stop_run failed");
                }
            }));
        }
        for join in joins {
            let _ = join.await;
        }
    }

    /// The single task per run that owns the parent channel and performs
    /// every store write and bus publish for that run's lifetime (§4.4
    /// "Event translation"). Serializing through one task per run is what
    /// gives subscribers the ordering guarantee in §4.4/§8 invariant 3.
    fn spawn_translation_task(
        self: &Arc<Self>,
        run_id: RunId,
        mut parent_rx: mpsc::Receiver<SupervisorMessage>,
        terminal: Arc<watch::Sender<bool>>,
    ) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(msg) = parent_rx.recv().await {
                match msg {
                    SupervisorMessage::Progress(p) => {
                        this.store.put_progress(run_id, p).await;
                        this.bus.publish(run_id, RunEvent::Progress(p));
                    }
                    SupervisorMessage::Log { message, timestamp_ms } => {
                        this.bus.publish(run_id, RunEvent::Log { message, timestamp_ms });
                    }
                    SupervisorMessage::Dead(reason) => {
                        this.handle_dead(run_id, reason).await;
                        break;
                    }
                }
            }
            this.active.lock().remove(&run_id);
            let _ = terminal.send(true);
        });
    }

    async fn handle_dead(&self, run_id: RunId, reason: DeadReason) {
        let now = self.clock.epoch_ms();
        match reason {
            DeadReason::WorkerTerminalComplete(summary) => {
                let outcome = self
                    .store
                    .update_if_status(
                        run_id,
                        RunStatus::Running,
                        Box::new(move |r| {
                            r.status = RunStatus::Completed;
                            r.completed_at_ms = Some(now);
                            r.summary = Some(summary);
                        }),
                    )
                    .await;
                self.publish_if_applied(run_id, outcome, RunEvent::Completed(summary));
            }
            DeadReason::StopRequested => {
                let outcome = self
                    .store
                    .update_if_status(
                        run_id,
                        RunStatus::Running,
                        Box::new(move |r| {
                            r.status = RunStatus::Stopped;
                            r.completed_at_ms = Some(now);
                        }),
                    )
                    .await;
                self.publish_if_applied(run_id, outcome, RunEvent::Stopped);
            }
            other => {
                let (message, details) = describe_failure(&other);
                let error = RunErrorInfo { message: message.clone(), details, at_ms: now };
                let outcome = self
                    .store
                    .update_if_status(
                        run_id,
                        RunStatus::Running,
                        Box::new(move |r| {
                            r.status = RunStatus::Failed;
                            r.completed_at_ms = Some(now);
                            r.error = Some(error);
                        }),
                    )
                    .await;
                self.publish_if_applied(run_id, outcome, RunEvent::Failed { message });
            }
        }
    }

    /// Test-only: the production surface deliberately does not expose the
    /// store or bus through the orchestrator (transports read the store and
    /// subscribe to the bus directly, per §5's resource table)
    /// — only integration tests that need to observe both sides of a race
    /// reach in here.
    #[cfg(test)]
    fn store_for_test(&self) -> &S {
        self.store.as_ref()
    }

    #[cfg(test)]
    fn bus_for_test(&self) -> &EventBus<C> {
        self.bus.as_ref()
    }

    /// Shared tail of every terminal transition: if the CAS did not apply,
    /// status was already terminal (e.g. stop raced completion, §8 S5) and
    /// the earlier terminal event is authoritative — publish nothing new. A
    /// store error on a terminal write is logged; it never gets retried
    /// (the run already has no live Supervisor to retry with).
    fn publish_if_applied(
        &self,
        run_id: RunId,
        outcome: Result<bool, loadtest_storage::RunStoreError>,
        event: RunEvent,
    ) {
        match outcome {
            Ok(true) => self.bus.publish(run_id, event),
            Ok(false) => {}
            Err(e) => {
                tracing::error!(run_id = %run_id, error = %e, "failed to persist terminal transition")
            }
        }
    }
}

/// Maps every non-`complete`/non-`stop_requested` [`DeadReason`] to the
/// descriptive `error.message` (and optional details) §7 requires.
fn describe_failure(reason: &DeadReason) -> (String, Option<String>) {
    match reason {
        DeadReason::WorkerTerminalError { message, details } => {
            (message.clone(), details.clone())
        }
        DeadReason::SpawnFailed(reason) => (format!("worker failed to spawn: {reason}"), None),
        DeadReason::ExitNonZero(code) => {
            (format!("worker exited with non-zero status {code}"), None)
        }
        DeadReason::ExitZeroWithoutTerminal => {
            ("worker exited without sending a terminal message".to_string(), None)
        }
        DeadReason::Timeout => {
            ("worker exceeded its timeout and was force-killed".to_string(), None)
        }
        DeadReason::WorkerTerminalComplete(_) | DeadReason::StopRequested => {
            unreachable!("handled by dedicated branches in handle_dead")
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
