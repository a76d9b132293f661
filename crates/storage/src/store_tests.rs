// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use loadtest_core::{RunId, SpecId};

fn record(started_at_ms: u64) -> RunRecord {
    RunRecord::new(RunId::new(), SpecId::new(), "spec".to_string(), started_at_ms)
}

#[tokio::test]
async fn create_then_get_round_trips() {
    let store = InMemoryRunStore::new();
    let record = record(1_000);
    let id = record.id;
    store.create(record).await.expect("create");
    let fetched = store.get(id).await.expect("get");
    assert_eq!(fetched.id, id);
    assert_eq!(fetched.status, RunStatus::Running);
}

#[tokio::test]
async fn create_duplicate_id_is_rejected() {
    let store = InMemoryRunStore::new();
    let record = record(1_000);
    let dup = record.clone();
    store.create(record).await.expect("create");
    let err = store.create(dup).await.unwrap_err();
    assert!(matches!(err, RunStoreError::DuplicateId(_)));
}

#[tokio::test]
async fn update_if_status_applies_only_on_match() {
    let store = InMemoryRunStore::new();
    let record = record(1_000);
    let id = record.id;
    store.create(record).await.expect("create");

    let applied = store
        .update_if_status(
            id,
            RunStatus::Running,
            Box::new(|r| {
                r.status = RunStatus::Stopped;
                r.completed_at_ms = Some(2_000);
            }),
        )
        .await
        .expect("update");
    assert!(applied);

    // second attempt with stale expected status is a silent no-op
    let applied_again = store
        .update_if_status(id, RunStatus::Running, Box::new(|r| r.status = RunStatus::Failed))
        .await
        .expect("update");
    assert!(!applied_again);

    let fetched = store.get(id).await.expect("get");
    assert_eq!(fetched.status, RunStatus::Stopped);
}

#[tokio::test]
async fn update_if_status_on_missing_run_errors() {
    let store = InMemoryRunStore::new();
    let err = store
        .update_if_status(RunId::new(), RunStatus::Running, Box::new(|_| {}))
        .await
        .unwrap_err();
    assert!(matches!(err, RunStoreError::NotFound(_)));
}

#[tokio::test]
async fn put_progress_is_ignored_once_terminal() {
    let store = InMemoryRunStore::new();
    let record = record(1_000);
    let id = record.id;
    store.create(record).await.expect("create");
    store
        .update_if_status(id, RunStatus::Running, Box::new(|r| r.status = RunStatus::Completed))
        .await
        .expect("update");

    store.put_progress(id, loadtest_core::ProgressMetrics { total_requests: 99, ..Default::default() }).await;
    let fetched = store.get(id).await.expect("get");
    assert_eq!(fetched.progress.total_requests, 0);
}

#[tokio::test]
async fn put_progress_on_missing_run_is_a_silent_noop() {
    let store = InMemoryRunStore::new();
    store.put_progress(RunId::new(), loadtest_core::ProgressMetrics::default()).await;
}

#[tokio::test]
async fn list_is_newest_first_and_capped() {
    let store = InMemoryRunStore::new();
    for i in 0..(LIST_LIMIT as u64 + 10) {
        store.create(record(i)).await.expect("create");
    }
    let listed = store.list().await;
    assert_eq!(listed.len(), LIST_LIMIT);
    assert!(listed[0].started_at_ms > listed[1].started_at_ms);
}

#[tokio::test]
async fn delete_requires_existing_record() {
    let store = InMemoryRunStore::new();
    let record = record(1_000);
    let id = record.id;
    store.create(record).await.expect("create");
    store.delete(id).await.expect("delete");
    assert!(store.get(id).await.is_none());
    assert!(matches!(store.delete(id).await.unwrap_err(), RunStoreError::NotFound(_)));
}
