// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Run Store: a persistent `runId -> RunRecord` mapping with the
//! compare-and-swap primitive terminal transitions must go through.

use crate::error::RunStoreError;
use crate::recovery::RecoveryLog;
use loadtest_core::{ProgressMetrics, RunId, RunRecord, RunStatus};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Most recent runs returned by `list`, oldest dropped first per §6.
pub const LIST_LIMIT: usize = 100;

#[async_trait::async_trait]
pub trait RunStore: Send + Sync {
    async fn create(&self, record: RunRecord) -> Result<(), RunStoreError>;
    async fn get(&self, id: RunId) -> Option<RunRecord>;
    /// Newest-first, capped at [`LIST_LIMIT`].
    async fn list(&self) -> Vec<RunRecord>;
    /// Apply `mutator` to the record iff its current status equals
    /// `expected`. `mutator` must set `status` (and `completed_at_ms` if
    /// transitioning to a terminal status) itself — the store does not infer
    /// field changes from the closure's effects. Returns whether it applied.
    async fn update_if_status(
        &self,
        id: RunId,
        expected: RunStatus,
        mutator: Box<dyn FnOnce(&mut RunRecord) + Send>,
    ) -> Result<bool, RunStoreError>;
    /// Best-effort progress write; a missing or already-terminal run is not
    /// an error, it is simply ignored (see §4.2).
    async fn put_progress(&self, id: RunId, progress: ProgressMetrics);
    /// Remove a terminal run's record. Fails with `Corrupt`-free `NotFound`
    /// if absent; callers enforce the "still running" guard before calling.
    async fn delete(&self, id: RunId) -> Result<(), RunStoreError>;
}

/// In-memory run store backed by an append-only recovery log (see
/// [`crate::recovery`]) so that terminal-transition accounting survives a
/// process restart even though live progress does not.
pub struct InMemoryRunStore {
    records: Mutex<HashMap<RunId, RunRecord>>,
    log: Option<Arc<RecoveryLog>>,
}

impl InMemoryRunStore {
    pub fn new() -> Self {
        Self { records: Mutex::new(HashMap::new()), log: None }
    }

    pub fn with_recovery_log(log: Arc<RecoveryLog>) -> Self {
        Self { records: Mutex::new(HashMap::new()), log: Some(log) }
    }

    /// Rebuild from a recovery log: replay `create`/terminal entries, and
    /// sweep any run that was created but never saw a terminal entry to
    /// `failed` (the orchestrator that owned its supervisor is gone).
    pub fn recover(log: Arc<RecoveryLog>) -> Result<Self, RunStoreError> {
        let entries = log.replay()?;
        let mut records = HashMap::new();
        for entry in entries {
            match entry {
                crate::recovery::RecoveryEntry::Created(record) => {
                    records.insert(record.id, record);
                }
                crate::recovery::RecoveryEntry::Terminal { id, status, completed_at_ms } => {
                    if let Some(r) = records.get_mut(&id) {
                        r.status = status;
                        r.completed_at_ms = Some(completed_at_ms);
                    }
                }
            }
        }
        for record in records.values_mut() {
            if record.status == RunStatus::Running {
                tracing::warn!(run_id = %record.id, "sweeping orphaned run to failed on recovery");
                record.status = RunStatus::Failed;
                record.completed_at_ms = Some(completed_at_ms_fallback(record));
                record.error = Some(loadtest_core::RunErrorInfo {
                    message: "orchestrator restarted while run was active".to_string(),
                    details: None,
                    at_ms: record.started_at_ms,
                });
            }
        }
        Ok(Self { records: Mutex::new(records), log: Some(log) })
    }
}

fn completed_at_ms_fallback(record: &RunRecord) -> u64 {
    record.completed_at_ms.unwrap_or(record.started_at_ms)
}

impl Default for InMemoryRunStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RunStore for InMemoryRunStore {
    async fn create(&self, record: RunRecord) -> Result<(), RunStoreError> {
        let mut records = self.records.lock();
        if records.contains_key(&record.id) {
            return Err(RunStoreError::DuplicateId(record.id));
        }
        if let Some(log) = &self.log {
            log.append_created(&record)?;
        }
        records.insert(record.id, record);
        Ok(())
    }

    async fn get(&self, id: RunId) -> Option<RunRecord> {
        self.records.lock().get(&id).cloned()
    }

    async fn list(&self) -> Vec<RunRecord> {
        let records = self.records.lock();
        let mut all: Vec<RunRecord> = records.values().cloned().collect();
        all.sort_by(|a, b| b.started_at_ms.cmp(&a.started_at_ms));
        all.truncate(LIST_LIMIT);
        all
    }

    async fn update_if_status(
        &self,
        id: RunId,
        expected: RunStatus,
        mutator: Box<dyn FnOnce(&mut RunRecord) + Send>,
    ) -> Result<bool, RunStoreError> {
        let mut records = self.records.lock();
        let Some(record) = records.get_mut(&id) else {
            return Err(RunStoreError::NotFound(id));
        };
        if record.status != expected {
            return Ok(false);
        }
        mutator(record);
        if record.status.is_terminal() {
            if let Some(log) = &self.log {
                log.append_terminal(record)?;
            }
        }
        Ok(true)
    }

    async fn put_progress(&self, id: RunId, progress: ProgressMetrics) {
        let mut records = self.records.lock();
        if let Some(record) = records.get_mut(&id) {
            if record.status == RunStatus::Running {
                record.progress = progress;
            }
        }
    }

    async fn delete(&self, id: RunId) -> Result<(), RunStoreError> {
        let mut records = self.records.lock();
        records.remove(&id).map(|_| ()).ok_or(RunStoreError::NotFound(id))
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
