// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run identifier, status lifecycle, and the persisted run record.

use crate::progress::{ProgressMetrics, RunErrorInfo, RunSummary};
use crate::spec::SpecId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for one execution of a spec.
    pub struct RunId("run-");
}

/// The run lifecycle. `Running` is the only non-terminal status; once a run
/// reaches `Completed`, `Stopped`, or `Failed` it never transitions again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Stopped,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

crate::simple_display! {
    RunStatus {
        Running => "running",
        Completed => "completed",
        Stopped => "stopped",
        Failed => "failed",
    }
}

/// A run's durable record. Mutated only by the orchestrator, and only through
/// [`crate::run::RunRecord`]'s status transitions being funneled through the
/// run store's compare-and-swap `update_if_status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: RunId,
    pub spec_id: SpecId,
    pub spec_name: String,
    pub status: RunStatus,
    pub started_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at_ms: Option<u64>,
    pub progress: ProgressMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<RunSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RunErrorInfo>,
}

impl RunRecord {
    pub fn new(id: RunId, spec_id: SpecId, spec_name: String, started_at_ms: u64) -> Self {
        Self {
            id,
            spec_id,
            spec_name,
            status: RunStatus::Running,
            started_at_ms,
            completed_at_ms: None,
            progress: ProgressMetrics::default(),
            summary: None,
            error: None,
        }
    }

    pub fn elapsed_seconds(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.started_at_ms) / 1000
    }
}

crate::builder! {
    pub struct RunRecordBuilder => RunRecord {
        set {
            id: RunId = RunId::new(),
            spec_id: SpecId = SpecId::new(),
            status: RunStatus = RunStatus::Running,
            started_at_ms: u64 = 1_000_000,
            progress: ProgressMetrics = ProgressMetrics::default(),
        }
        into {
            spec_name: String = "test-spec",
        }
        option {
            completed_at_ms: u64 = None,
            summary: RunSummary = None,
            error: RunErrorInfo = None,
        }
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
