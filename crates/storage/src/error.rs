// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use loadtest_core::RunId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunStoreError {
    #[error("run {0} already exists")]
    DuplicateId(RunId),
    #[error("run {0} not found")]
    NotFound(RunId),
    #[error("recovery log io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("recovery log entry is malformed: {0}")]
    Corrupt(String),
}
