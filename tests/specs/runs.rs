//! HTTP surface tests (§6): one test per row of the method/path table.

use crate::support::{insert_quick_spec, insert_spec, test_state};
use axum::body::Body;
use http_body_util::BodyExt;
use hyper::{Request, StatusCode};
use loadtest_core::test_support::test_spec;
use loadtest_core::SpecId;
use std::time::Duration;
use tower::ServiceExt;

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = resp.into_body().collect().await.expect("collect body").to_bytes();
    serde_json::from_slice(&bytes).expect("response body is valid json")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).expect("build request")
}

fn post(uri: &str) -> Request<Body> {
    Request::builder().method("POST").uri(uri).body(Body::empty()).expect("build request")
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder().method("DELETE").uri(uri).body(Body::empty()).expect("build request")
}

#[tokio::test]
async fn post_runs_spec_id_admits_and_returns_run_id() {
    let state = test_state(4, Duration::from_secs(3600));
    let spec_id = insert_quick_spec(&state, "http-start");
    let app = loadtest_daemon::build_router(state);

    let resp = app.oneshot(post(&format!("/runs/{spec_id}"))).await.expect("request");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert!(body["run_id"].as_str().is_some());
}

#[tokio::test]
async fn post_runs_unknown_spec_is_404_spec_not_found() {
    let state = test_state(4, Duration::from_secs(3600));
    let app = loadtest_daemon::build_router(state);

    let resp =
        app.oneshot(post(&format!("/runs/{}", SpecId::new()))).await.expect("request");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await;
    assert_eq!(body["code"], "spec_not_found");
}

#[tokio::test]
async fn post_runs_invalid_spec_is_400_spec_invalid() {
    let state = test_state(4, Duration::from_secs(3600));
    let mut spec = test_spec("http-invalid", 1, 1);
    spec.load_profile.steady = 0;
    let spec_id = insert_spec(&state, spec);
    let app = loadtest_daemon::build_router(state);

    let resp = app.oneshot(post(&format!("/runs/{spec_id}"))).await.expect("request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["code"], "spec_invalid");
}

#[tokio::test]
async fn post_runs_over_capacity_is_429() {
    let state = test_state(1, Duration::from_secs(3600));
    let a = insert_quick_spec(&state, "cap-a");
    let b = insert_quick_spec(&state, "cap-b");
    let app = loadtest_daemon::build_router(state);

    let first = app.clone().oneshot(post(&format!("/runs/{a}"))).await.expect("request");
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app.oneshot(post(&format!("/runs/{b}"))).await.expect("request");
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = body_json(second).await;
    assert_eq!(body["code"], "capacity_exhausted");
}

#[tokio::test]
async fn get_run_roundtrips_after_completion_and_delete_then_requires_terminal() {
    let state = test_state(4, Duration::from_millis(1));
    let spec_id = insert_quick_spec(&state, "http-roundtrip");
    let app = loadtest_daemon::build_router(state);

    let created = app.clone().oneshot(post(&format!("/runs/{spec_id}"))).await.expect("request");
    let run_id = body_json(created).await["run_id"].as_str().expect("run_id").to_string();

    // Deleting a still-running run is refused.
    let early_delete =
        app.clone().oneshot(delete(&format!("/runs/{run_id}/delete"))).await.expect("request");
    assert_eq!(early_delete.status(), StatusCode::BAD_REQUEST);

    // Poll the record until it reaches a terminal status.
    let mut record = serde_json::Value::Null;
    for _ in 0..200 {
        let resp = app.clone().oneshot(get(&format!("/runs/{run_id}"))).await.expect("request");
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        record = body["run"].clone();
        if record["status"] != "running" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(record["status"], "completed");

    let deleted = app.clone().oneshot(delete(&format!("/runs/{run_id}/delete"))).await.expect("request");
    assert_eq!(deleted.status(), StatusCode::OK);

    let missing = app.oneshot(get(&format!("/runs/{run_id}"))).await.expect("request");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stop_run_unknown_id_is_404_run_not_found() {
    let state = test_state(4, Duration::from_secs(3600));
    let app = loadtest_daemon::build_router(state);

    let resp =
        app.oneshot(delete(&format!("/runs/{}", loadtest_core::RunId::new()))).await.expect("request");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stop_run_then_list_active_reflects_it_ending() {
    let state = test_state(4, Duration::from_secs(3600));
    let spec_id = insert_quick_spec(&state, "http-stop");
    let app = loadtest_daemon::build_router(state);

    let created = app.clone().oneshot(post(&format!("/runs/{spec_id}"))).await.expect("request");
    let run_id = body_json(created).await["run_id"].as_str().expect("run_id").to_string();

    let active = app.clone().oneshot(get("/runs/active")).await.expect("request");
    let body = body_json(active).await;
    assert_eq!(body["active_runs"].as_array().expect("array").len(), 1);

    let stopped = app.clone().oneshot(delete(&format!("/runs/{run_id}"))).await.expect("request");
    assert_eq!(stopped.status(), StatusCode::OK);

    let active_after = app.oneshot(get("/runs/active")).await.expect("request");
    let body_after = body_json(active_after).await;
    assert!(body_after["active_runs"].as_array().expect("array").is_empty());
}

#[tokio::test]
async fn list_runs_caps_at_100_newest_first() {
    let state = test_state(1, Duration::from_millis(1));
    let mut ids = Vec::new();
    for i in 0..3 {
        let spec_id = insert_quick_spec(&state, &format!("http-list-{i}"));
        ids.push(spec_id);
    }
    let app = loadtest_daemon::build_router(state);

    for spec_id in &ids {
        let created = app.clone().oneshot(post(&format!("/runs/{spec_id}"))).await.expect("request");
        assert_eq!(created.status(), StatusCode::CREATED);
        // max_workers=1: wait for this run to finish before admitting the next.
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let resp = app.oneshot(get("/runs")).await.expect("request");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let runs = body["runs"].as_array().expect("array");
    assert_eq!(runs.len(), 3);
}

#[tokio::test]
async fn csv_export_requires_a_summary_then_returns_the_fixed_columns() {
    let state = test_state(4, Duration::from_millis(1));
    let spec_id = insert_quick_spec(&state, "http-csv");
    let app = loadtest_daemon::build_router(state);

    let created = app.clone().oneshot(post(&format!("/runs/{spec_id}"))).await.expect("request");
    let run_id = body_json(created).await["run_id"].as_str().expect("run_id").to_string();

    let too_early =
        app.clone().oneshot(get(&format!("/runs/{run_id}/csv"))).await.expect("request");
    assert_eq!(too_early.status(), StatusCode::BAD_REQUEST);

    let mut status = "running".to_string();
    for _ in 0..200 {
        let resp = app.clone().oneshot(get(&format!("/runs/{run_id}"))).await.expect("request");
        let body = body_json(resp).await;
        status = body["run"]["status"].as_str().expect("status").to_string();
        if status != "running" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(status, "completed");

    let csv_resp = app.oneshot(get(&format!("/runs/{run_id}/csv"))).await.expect("request");
    assert_eq!(csv_resp.status(), StatusCode::OK);
    let bytes = csv_resp.into_body().collect().await.expect("collect body").to_bytes();
    let text = String::from_utf8(bytes.to_vec()).expect("utf8 csv");
    assert!(text.starts_with("Run ID,Spec Name,Status,Started At,Completed At,Total Requests"));
    assert_eq!(text.lines().count(), 2);
}

#[tokio::test]
async fn csv_export_unknown_run_is_404() {
    let state = test_state(4, Duration::from_secs(3600));
    let app = loadtest_daemon::build_router(state);

    let resp = app
        .oneshot(get(&format!("/runs/{}/csv", loadtest_core::RunId::new())))
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
