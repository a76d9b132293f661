// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progress snapshots, completion summaries, and failure details reported by
//! a worker over the wire and mirrored onto a [`crate::run::RunRecord`].

use serde::{Deserialize, Serialize};

/// Latest known progress for a running run. Best-effort: a late update racing
/// a terminal transition may be silently discarded by the run store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressMetrics {
    pub current_rps: f64,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub average_latency_ms: f64,
    pub elapsed_seconds: u64,
}

impl Default for ProgressMetrics {
    fn default() -> Self {
        Self {
            current_rps: 0.0,
            total_requests: 0,
            successful_requests: 0,
            failed_requests: 0,
            average_latency_ms: 0.0,
            elapsed_seconds: 0,
        }
    }
}

/// Final statistics attached to a run on the `running -> completed` transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub average_rps: f64,
    pub p50_latency_ms: f64,
    pub p95_latency_ms: f64,
    pub p99_latency_ms: f64,
    pub error_rate: f64,
    pub duration_seconds: u64,
}

/// Failure detail attached to a run on the `running -> failed` transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunErrorInfo {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub at_ms: u64,
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
