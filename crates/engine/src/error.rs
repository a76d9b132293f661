// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use loadtest_storage::RunStoreError;
use thiserror::Error;

/// Errors an `Orchestrator` call can return. Every variant here is the one
/// the daemon's HTTP layer maps to a status code (§6) — exhaustively, so a
/// new variant without a matching mapping is a compiler error there.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("spec not found")]
    SpecNotFound,

    #[error("spec invalid: {0}")]
    SpecInvalid(String),

    #[error("run not found")]
    RunNotFound,

    #[error("at capacity")]
    CapacityExhausted,

    #[error("run has no summary")]
    NoSummary,

    #[error("run still running")]
    StillRunning,

    #[error("store error: {0}")]
    Store(#[from] RunStoreError),
}

/// A Supervisor's terminal cause, carried on its one `dead` transition
/// (§4.3). Never escapes to a caller directly — the Orchestrator's event
/// translation task turns it into a `RunStatus`/event pair.
#[derive(Debug, Clone)]
pub enum DeadReason {
    WorkerTerminalComplete(loadtest_core::RunSummary),
    WorkerTerminalError { message: String, details: Option<String> },
    /// The process-worker path (§4.3): a `WorkerFactory` backed by a real
    /// child process can fail to `exec`; the in-process `SimulatedWorker`'s
    /// `spawn` cannot fail, so this variant is matched in `describe_failure`
    /// but never constructed today.
    SpawnFailed(String),
    /// The process-worker path (§4.3): a real child's non-zero exit status
    /// with no prior terminal message. The in-process `SimulatedWorker` has
    /// no exit code, so this variant is matched but never constructed today.
    ExitNonZero(i32),
    ExitZeroWithoutTerminal,
    Timeout,
    StopRequested,
}

impl DeadReason {
    pub fn is_stop_requested(&self) -> bool {
        matches!(self, DeadReason::StopRequested)
    }
}
