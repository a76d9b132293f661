// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/runs` handlers (§6 HTTP surface). Each returns the exact success/error
//! pairing the table enumerates; `AppError` carries every failure path
//! through to its status code.

use crate::error::AppError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use loadtest_core::{RunId, SpecId};
use loadtest_storage::RunStore;
use serde_json::json;

pub async fn start_run(
    State(state): State<AppState>,
    Path(spec_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let run_id = state.orchestrator.start_run(SpecId::from(spec_id)).await?;
    Ok((StatusCode::CREATED, Json(json!({ "run_id": run_id }))))
}

pub async fn stop_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.orchestrator.stop_run(RunId::from(run_id)).await?;
    Ok(StatusCode::OK)
}

pub async fn delete_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.orchestrator.delete_run(RunId::from(run_id)).await?;
    Ok(StatusCode::OK)
}

pub async fn list_runs(State(state): State<AppState>) -> Json<serde_json::Value> {
    let runs = state.store.list().await;
    Json(json!({ "runs": runs }))
}

pub async fn get_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let run_id = RunId::from(run_id);
    let record = state.store.get(run_id).await.ok_or(loadtest_engine::OrchestratorError::RunNotFound)?;
    Ok(Json(json!({ "run": record })))
}

pub async fn list_active(State(state): State<AppState>) -> Json<serde_json::Value> {
    let active_runs = state.orchestrator.list_active();
    Json(json!({ "active_runs": active_runs }))
}

/// CSV columns fixed by §6, in order.
const CSV_HEADERS: &[&str] = &[
    "Run ID",
    "Spec Name",
    "Status",
    "Started At",
    "Completed At",
    "Total Requests",
    "Successful Requests",
    "Failed Requests",
    "Average RPS",
    "P50 Latency (ms)",
    "P95 Latency (ms)",
    "P99 Latency (ms)",
    "Error Rate (%)",
    "Duration (s)",
];

pub async fn export_csv(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let run_id = RunId::from(run_id);
    let record = state.store.get(run_id).await.ok_or(loadtest_engine::OrchestratorError::RunNotFound)?;
    let summary = record.summary.ok_or(loadtest_engine::OrchestratorError::NoSummary)?;

    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(CSV_HEADERS).map_err(csv_io_error)?;
    writer
        .write_record(&[
            record.id.to_string(),
            record.spec_name.clone(),
            record.status.to_string(),
            record.started_at_ms.to_string(),
            record.completed_at_ms.map(|v| v.to_string()).unwrap_or_default(),
            summary.total_requests.to_string(),
            summary.successful_requests.to_string(),
            summary.failed_requests.to_string(),
            summary.average_rps.to_string(),
            summary.p50_latency_ms.to_string(),
            summary.p95_latency_ms.to_string(),
            summary.p99_latency_ms.to_string(),
            summary.error_rate.to_string(),
            summary.duration_seconds.to_string(),
        ])
        .map_err(csv_io_error)?;
    let bytes = writer.into_inner().map_err(|e| csv_io_error(e.into_error()))?;

    Ok(([(header::CONTENT_TYPE, "text/csv")], bytes))
}

fn csv_io_error(e: csv::Error) -> AppError {
    AppError::from(loadtest_engine::OrchestratorError::Store(
        loadtest_storage::RunStoreError::Corrupt(e.to_string()),
    ))
}
