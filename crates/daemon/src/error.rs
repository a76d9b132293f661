// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps [`OrchestratorError`] to HTTP status codes and JSON error bodies —
//! the fixed table in §6. Exhaustive on purpose: a new
//! `OrchestratorError` variant without a matching arm here is a compiler
//! error, not a silent 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use loadtest_engine::OrchestratorError;
use serde_json::json;

pub struct AppError(OrchestratorError);

impl From<OrchestratorError> for AppError {
    fn from(e: OrchestratorError) -> Self {
        Self(e)
    }
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            OrchestratorError::SpecNotFound => (StatusCode::NOT_FOUND, "spec_not_found"),
            OrchestratorError::SpecInvalid(_) => (StatusCode::BAD_REQUEST, "spec_invalid"),
            OrchestratorError::RunNotFound => (StatusCode::NOT_FOUND, "run_not_found"),
            OrchestratorError::CapacityExhausted => {
                (StatusCode::TOO_MANY_REQUESTS, "capacity_exhausted")
            }
            OrchestratorError::NoSummary => (StatusCode::BAD_REQUEST, "no_summary"),
            OrchestratorError::StillRunning => (StatusCode::BAD_REQUEST, "still_running"),
            OrchestratorError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let body = json!({ "error": self.0.to_string(), "code": code });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
