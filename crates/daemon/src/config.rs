// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon binary (§6
//! Configuration). Every variable here has a fixed default so the daemon is
//! runnable with no environment at all.

use std::path::PathBuf;
use std::time::Duration;

/// Concurrency cap `N` (§4.4 admission). `MAX_WORKERS`, default 4.
pub fn max_workers() -> usize {
    env_parse("MAX_WORKERS").unwrap_or(4)
}

/// Supervisor wall-clock deadline from `starting` (§4.3). `WORKER_TIMEOUT_MS`,
/// default 300000 (5 minutes).
pub fn worker_timeout() -> Duration {
    Duration::from_millis(env_parse("WORKER_TIMEOUT_MS").unwrap_or(300_000))
}

/// Grace given to a child to exit after its own terminal message before the
/// Supervisor force-kills it. Not itself named in §6's enumerated list;
/// derived as a small fraction of the worker timeout, floored at one second.
pub fn kill_grace() -> Duration {
    Duration::from_millis((env_parse::<u64>("WORKER_TIMEOUT_MS").unwrap_or(300_000) / 60).max(1_000))
}

/// Time a terminated Event Bus topic is retained for late subscribers (§4.1).
/// `TERMINAL_GRACE_MS`, default 30000.
pub fn terminal_grace() -> Duration {
    Duration::from_millis(env_parse("TERMINAL_GRACE_MS").unwrap_or(30_000))
}

/// Per-subscriber bounded queue length (§5). `SUBSCRIBER_QUEUE`, default 256.
pub fn subscriber_queue() -> usize {
    env_parse("SUBSCRIBER_QUEUE").unwrap_or(256)
}

/// HTTP/WS listen address. `BIND_ADDR`, default `0.0.0.0:8080`.
pub fn bind_addr() -> String {
    std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string())
}

/// Directory for the Run Store's recovery log (§3 "Recovery record").
/// `STATE_DIR`, default `./.loadtest/state`.
pub fn state_dir() -> PathBuf {
    std::env::var("STATE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./.loadtest/state"))
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
