// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `SimulatedWorker`: the in-process stand-in for the actual
//! request-generating engine (out of scope per §1). It shapes
//! ramp-up/steady/ramp-down progress deterministically from the spec's
//! `loadProfile` so the orchestrator and its tests have a real, obedient
//! implementation of the wire protocol (§6) to drive against.
//!
//! Two magic URL substrings exist purely to make worker misbehavior
//! reproducible in tests via scripted failure hooks: a url containing
//! `simulate-failure` sends a
//! terminal `error` after one tick instead of completing, and a url
//! containing `simulate-hang` never sends a terminal message at all (so a
//! supervisor test can exercise its timeout path without a real hang).

use crate::worker::{WorkerFactory, WorkerHandle};
use async_trait::async_trait;
use loadtest_core::{ProgressMetrics, RunSummary, Spec};
use loadtest_wire::WorkerMessage;
use std::time::Duration;
use tokio::sync::mpsc;

const REQUESTS_PER_USER_PER_SECOND: f64 = 10.0;
const SIMULATED_FAILURE_RATE: f64 = 0.02;
const SIMULATED_LATENCY_MS: f64 = 8.0;

pub struct SimulatedWorker {
    /// Wall-clock duration per simulated second. Kept small by default so
    /// tests don't block on a real multi-second load test; a production
    /// deployment would use `Duration::from_secs(1)`.
    tick: Duration,
    channel_capacity: usize,
}

impl SimulatedWorker {
    pub fn new() -> Self {
        Self { tick: Duration::from_millis(50), channel_capacity: 64 }
    }

    pub fn with_tick(tick: Duration) -> Self {
        Self { tick, channel_capacity: 64 }
    }
}

impl Default for SimulatedWorker {
    fn default() -> Self {
        Self::new()
    }
}

/// Virtual-user concurrency at simulated second `t` for a ramp-up/steady/
/// ramp-down profile.
fn concurrency_at(t: u32, ramp_up: u32, steady: u32, ramp_down: u32, users: u32) -> f64 {
    if ramp_up > 0 && t < ramp_up {
        users as f64 * (t as f64 + 1.0) / ramp_up as f64
    } else if t < ramp_up + steady {
        users as f64
    } else if ramp_down > 0 && t < ramp_up + steady + ramp_down {
        let into_down = t - (ramp_up + steady);
        users as f64 * (1.0 - (into_down as f64 + 1.0) / ramp_down as f64).max(0.0)
    } else {
        0.0
    }
}

#[async_trait]
impl WorkerFactory for SimulatedWorker {
    async fn spawn(&self, spec: Spec) -> WorkerHandle {
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let tick = self.tick;

        let task = tokio::spawn(async move {
            let url = spec.request.url.clone();
            if url.contains("simulate-hang") {
                // Never emits a terminal message; the supervisor's own
                // timeout is what ends this run.
                std::future::pending::<()>().await;
                return;
            }

            let profile = spec.load_profile;
            let total_seconds = profile.ramp_up + profile.steady + profile.ramp_down;
            let mut total_requests: u64 = 0;
            let mut successful_requests: u64 = 0;
            let mut failed_requests: u64 = 0;
            let mut latencies_ms: Vec<f64> = Vec::new();

            for t in 0..total_seconds.max(1) {
                tokio::time::sleep(tick).await;

                let concurrency = concurrency_at(
                    t,
                    profile.ramp_up,
                    profile.steady,
                    profile.ramp_down,
                    profile.users,
                );
                let requests_this_tick =
                    (concurrency * REQUESTS_PER_USER_PER_SECOND).round() as u64;

                for i in 0..requests_this_tick {
                    total_requests += 1;
                    let is_failure = url.contains("simulate-failure")
                        || (i as f64 / requests_this_tick.max(1) as f64) < SIMULATED_FAILURE_RATE;
                    if is_failure {
                        failed_requests += 1;
                    } else {
                        successful_requests += 1;
                    }
                    latencies_ms.push(SIMULATED_LATENCY_MS);
                }

                if url.contains("simulate-failure") {
                    let _ = tx
                        .send(WorkerMessage::Error {
                            message: "simulated upstream failure".to_string(),
                            details: Some(format!("failed after {total_requests} requests")),
                        })
                        .await;
                    return;
                }

                let elapsed = t + 1;
                let progress = ProgressMetrics {
                    current_rps: requests_this_tick as f64,
                    total_requests,
                    successful_requests,
                    failed_requests,
                    average_latency_ms: SIMULATED_LATENCY_MS,
                    elapsed_seconds: elapsed as u64,
                };
                if tx.send(WorkerMessage::Progress(progress)).await.is_err() {
                    return;
                }
            }

            latencies_ms.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let percentile = |p: f64| -> f64 {
                if latencies_ms.is_empty() {
                    return 0.0;
                }
                let idx = ((latencies_ms.len() as f64 - 1.0) * p).round() as usize;
                latencies_ms[idx.min(latencies_ms.len() - 1)]
            };
            let duration_seconds = total_seconds.max(1) as u64;
            let summary = RunSummary {
                total_requests,
                successful_requests,
                failed_requests,
                average_rps: total_requests as f64 / duration_seconds as f64,
                p50_latency_ms: percentile(0.50),
                p95_latency_ms: percentile(0.95),
                p99_latency_ms: percentile(0.99),
                error_rate: if total_requests == 0 {
                    0.0
                } else {
                    failed_requests as f64 / total_requests as f64 * 100.0
                },
                duration_seconds,
            };
            let _ = tx.send(WorkerMessage::Complete(summary)).await;
        });

        WorkerHandle { messages: rx, task }
    }
}

#[cfg(test)]
#[path = "sim_tests.rs"]
mod tests;
