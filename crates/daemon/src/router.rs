// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Router construction (§6 HTTP surface + Subscription surface).

use crate::handlers::{runs, ws};
use crate::state::AppState;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/runs/:spec_id", post(runs::start_run))
        .route("/runs", get(runs::list_runs))
        .route("/runs/active", get(runs::list_active))
        .route("/runs/:run_id", get(runs::get_run))
        .route("/runs/:run_id", delete(runs::stop_run))
        .route("/runs/:run_id/csv", get(runs::export_csv))
        .route("/runs/:run_id/delete", delete(runs::delete_run))
        .route("/runs/:run_id/stream", get(ws::stream_run))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
