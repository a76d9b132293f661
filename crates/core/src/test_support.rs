// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::progress::ProgressMetrics;
use crate::run::RunStatus;
use crate::spec::{HttpMethod, LoadProfile, RequestSpec, Spec, SpecId};
use std::collections::HashMap;

/// Build a minimal, always-valid spec for use in tests.
pub fn test_spec(id: &str, users: u32, steady: u32) -> Spec {
    Spec {
        id: SpecId::from_string(id),
        name: format!("spec-{id}"),
        request: RequestSpec {
            method: HttpMethod::Get,
            url: "https://example.invalid/ok".to_string(),
            headers: HashMap::new(),
            query_params: HashMap::new(),
            body: None,
            attachment_id: None,
        },
        load_profile: LoadProfile { ramp_up: 0, users, steady, ramp_down: 0 },
    }
}

pub fn progress_at(total: u64, successful: u64, failed: u64, elapsed: u64) -> ProgressMetrics {
    ProgressMetrics {
        current_rps: total as f64 / (elapsed.max(1) as f64),
        total_requests: total,
        successful_requests: successful,
        failed_requests: failed,
        average_latency_ms: 5.0,
        elapsed_seconds: elapsed,
    }
}

/// Proptest strategies for core state machine types.
pub mod strategies {
    use super::RunStatus;
    use proptest::prelude::*;

    pub fn arb_run_status() -> impl Strategy<Value = RunStatus> {
        prop_oneof![
            Just(RunStatus::Running),
            Just(RunStatus::Completed),
            Just(RunStatus::Stopped),
            Just(RunStatus::Failed),
        ]
    }

    pub fn arb_terminal_status() -> impl Strategy<Value = RunStatus> {
        prop_oneof![Just(RunStatus::Completed), Just(RunStatus::Stopped), Just(RunStatus::Failed),]
    }
}
