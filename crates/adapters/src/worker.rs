// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Worker` boundary: the opaque, request-generating child execution
//! context a [`crate::sim::SimulatedWorker`] (or, in a production deployment,
//! an OS process/container bridge fronting an external process's socket) is
//! spawned behind.

use async_trait::async_trait;
use loadtest_core::Spec;
use loadtest_wire::WorkerMessage;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A live worker: its outbound message stream and a handle the supervisor
/// can use to force-cancel it. There is deliberately no inbound channel —
/// the wire protocol (§6) sends exactly one `start` at spawn time, which is
/// why `spawn` takes the resolved spec directly rather than over a channel.
pub struct WorkerHandle {
    pub messages: mpsc::Receiver<WorkerMessage>,
    pub task: JoinHandle<()>,
}

impl WorkerHandle {
    /// Force-terminate the worker task. Idempotent: aborting an
    /// already-finished task is a no-op.
    pub fn kill(&self) {
        self.task.abort();
    }

    /// True once the underlying task has finished (normally or via `kill`).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawns the single explicit worker execution mechanism this deployment
/// uses (§4.3's one-explicit-spawn-mechanism decision).
#[async_trait]
pub trait WorkerFactory: Send + Sync {
    async fn spawn(&self, spec: Spec) -> WorkerHandle;
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
