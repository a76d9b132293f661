// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
#[serial]
fn defaults_match_spec_values() {
    for key in [
        "MAX_WORKERS",
        "WORKER_TIMEOUT_MS",
        "TERMINAL_GRACE_MS",
        "SUBSCRIBER_QUEUE",
        "BIND_ADDR",
        "STATE_DIR",
    ] {
        std::env::remove_var(key);
    }

    assert_eq!(max_workers(), 4);
    assert_eq!(worker_timeout(), Duration::from_millis(300_000));
    assert_eq!(terminal_grace(), Duration::from_millis(30_000));
    assert_eq!(subscriber_queue(), 256);
    assert_eq!(bind_addr(), "0.0.0.0:8080");
    assert_eq!(state_dir(), PathBuf::from("./.loadtest/state"));
}

#[test]
#[serial]
fn env_overrides_are_parsed() {
    std::env::set_var("MAX_WORKERS", "8");
    std::env::set_var("BIND_ADDR", "127.0.0.1:9090");

    assert_eq!(max_workers(), 8);
    assert_eq!(bind_addr(), "127.0.0.1:9090");

    std::env::remove_var("MAX_WORKERS");
    std::env::remove_var("BIND_ADDR");
}

#[test]
#[serial]
fn malformed_override_falls_back_to_default() {
    std::env::set_var("MAX_WORKERS", "not-a-number");
    assert_eq!(max_workers(), 4);
    std::env::remove_var("MAX_WORKERS");
}
