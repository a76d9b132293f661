// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A crash-safe, append-only log of run creation and terminal-transition
//! facts, newline-delimited JSON on disk. This is deliberately *not* a full
//! event-sourced WAL over every state change (progress updates are never
//! logged) — only enough is durable to let [`crate::store::InMemoryRunStore`]
//! tell, on restart, which runs never reached a terminal status and must be
//! swept to `failed` (see §3, "Recovery record").

use crate::error::RunStoreError;
use loadtest_core::{RunId, RunRecord, RunStatus};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum RecoveryEntry {
    Created(RunRecord),
    Terminal { id: RunId, status: RunStatus, completed_at_ms: u64 },
}

pub struct RecoveryLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl RecoveryLog {
    /// Open (creating if absent) the recovery log at `dir/runs.log`.
    pub fn open(dir: &Path) -> Result<Self, RunStoreError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join("runs.log");
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file: Mutex::new(file) })
    }

    fn append(&self, entry: &RecoveryEntry) -> Result<(), RunStoreError> {
        let line = serde_json::to_string(entry)
            .map_err(|e| RunStoreError::Corrupt(format!("failed to encode entry: {e}")))?;
        let mut file = self.file.lock();
        writeln!(file, "{line}")?;
        file.flush()?;
        Ok(())
    }

    pub fn append_created(&self, record: &RunRecord) -> Result<(), RunStoreError> {
        self.append(&RecoveryEntry::Created(record.clone()))
    }

    pub fn append_terminal(&self, record: &RunRecord) -> Result<(), RunStoreError> {
        self.append(&RecoveryEntry::Terminal {
            id: record.id,
            status: record.status,
            completed_at_ms: record.completed_at_ms.unwrap_or(record.started_at_ms),
        })
    }

    /// Replay every entry in file order. A malformed trailing line (e.g. a
    /// torn write from a crash mid-append) is skipped with a warning rather
    /// than failing the whole replay.
    pub fn replay(&self) -> Result<Vec<RecoveryEntry>, RunStoreError> {
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<RecoveryEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!(error = %e, "skipping malformed recovery log line"),
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
