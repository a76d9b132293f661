// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Worker Supervisor (§4.3): supervises exactly one child execution
//! context and translates its messages into orchestrator-facing events. The
//! Supervisor never touches the Run Store or Event Bus directly — it only
//! ever emits onto the single parent channel the Orchestrator owns.

use crate::error::DeadReason;
use loadtest_adapters::{WorkerFactory, WorkerHandle};
use loadtest_core::{ProgressMetrics, Spec};
use loadtest_wire::WorkerMessage;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Translated child output, forwarded to the Orchestrator's per-run event
/// translation task. Exactly one [`SupervisorMessage::Dead`] is ever sent,
/// and nothing follows it.
pub enum SupervisorMessage {
    Progress(ProgressMetrics),
    Log { message: String, timestamp_ms: u64 },
    Dead(DeadReason),
}

/// A live Supervisor: a request-stop signal plus the task driving its state
/// machine, so the Orchestrator can tell whether it has reached `dead` yet.
pub struct SupervisorHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SupervisorHandle {
    /// Issues `stop_requested`. Idempotent: a second call after the first is
    /// a no-op (the oneshot sender is already consumed).
    pub fn request_stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }

    pub fn is_dead(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the Supervisor task to finish. Used by `shutdown` and by
    /// `stopRun`, which is synchronous with respect to the terminal state.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

/// Default wall-clock deadline from `starting`, per §5 (`WORKER_TIMEOUT_MS`).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
/// Bounded grace given to the child to exit after its own terminal message.
pub const DEFAULT_KILL_GRACE: Duration = Duration::from_secs(5);

/// Spawns a Supervisor over one `spec`, using `factory` as the single
/// explicit execution mechanism (§4.3 expansion). Every translated message —
/// including the final `Dead` — is sent on `parent_tx`.
pub async fn spawn_supervisor<W: WorkerFactory>(
    factory: &W,
    spec: Spec,
    timeout: Duration,
    kill_grace: Duration,
    parent_tx: mpsc::Sender<SupervisorMessage>,
) -> SupervisorHandle {
    let child = factory.spawn(spec).await;
    let (stop_tx, stop_rx) = oneshot::channel();

    let task = tokio::spawn(async move {
        let reason = run_supervised(child, timeout, kill_grace, stop_rx, &parent_tx).await;
        let _ = parent_tx.send(SupervisorMessage::Dead(reason)).await;
    });

    SupervisorHandle { stop_tx: Some(stop_tx), task }
}

async fn run_supervised(
    mut child: WorkerHandle,
    timeout: Duration,
    kill_grace: Duration,
    mut stop_rx: oneshot::Receiver<()>,
    parent_tx: &mpsc::Sender<SupervisorMessage>,
) -> DeadReason {
    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            msg = child.messages.recv() => {
                match msg {
                    Some(WorkerMessage::Progress(p)) => {
                        let _ = parent_tx.send(SupervisorMessage::Progress(p)).await;
                    }
                    Some(WorkerMessage::Log { message, timestamp_ms }) => {
                        let _ = parent_tx.send(SupervisorMessage::Log { message, timestamp_ms }).await;
                    }
                    Some(WorkerMessage::Complete(summary)) => {
                        return wait_for_exit(
                            child,
                            kill_grace,
                            DeadReason::WorkerTerminalComplete(summary),
                        )
                        .await;
                    }
                    Some(WorkerMessage::Error { message, details }) => {
                        return wait_for_exit(
                            child,
                            kill_grace,
                            DeadReason::WorkerTerminalError { message, details },
                        )
                        .await;
                    }
                    None => {
                        // The channel closed with no terminal message: the
                        // contract requires an explicit terminal payload, so
                        // even a clean exit here is a failure (§4.3).
                        return DeadReason::ExitZeroWithoutTerminal;
                    }
                }
            }
            _ = &mut deadline => {
                child.kill();
                let _ = child.task.await;
                return DeadReason::Timeout;
            }
            _ = &mut stop_rx => {
                child.kill();
                let _ = child.task.await;
                return DeadReason::StopRequested;
            }
        }
    }
}

/// After the child's own terminal message, give it `grace` to actually exit
/// before force-killing. Mirrors the state machine's `live -> dead` rule: the
/// reason the caller observed is reported regardless of how the exit wait
/// resolves — force-killing a child that already told us it's done is
/// cleanup, not a different outcome.
async fn wait_for_exit(mut child: WorkerHandle, grace: Duration, reason: DeadReason) -> DeadReason {
    if tokio::time::timeout(grace, &mut child.task).await.is_err() {
        tracing::warn!("worker did not exit within grace after its terminal message, force-killing");
        child.kill();
    }
    reason
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
