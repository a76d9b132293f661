// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The parent<->worker message protocol: what the orchestrator sends a
//! worker to start it, and what a worker reports back while it runs.

use loadtest_core::{ProgressMetrics, RunSummary, Spec};
use serde::{Deserialize, Serialize};

/// Parent -> worker. Sent exactly once, at spawn time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParentMessage {
    Start { spec: Spec },
}

/// Worker -> parent. Zero or more `Progress`/`Log`, then exactly one of
/// `Complete`/`Error`, after which the worker is expected to exit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerMessage {
    Progress(ProgressMetrics),
    Log { message: String, timestamp_ms: u64 },
    Complete(RunSummary),
    Error { message: String, details: Option<String> },
}

impl WorkerMessage {
    /// Whether this message is the one-and-only terminal message a worker
    /// may send; the supervisor treats anything after this as a protocol
    /// violation (logged, not propagated).
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkerMessage::Complete(_) | WorkerMessage::Error { .. })
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
