//! WebSocket subscription surface tests (§6 `GET /runs/{runId}/stream`):
//! driven over a real TCP socket with `tokio-tungstenite`, since an in-memory
//! `tower::oneshot` request can't perform the upgrade handshake.

use crate::support::{insert_quick_spec, test_state};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

async fn spawn_test_server(
    state: loadtest_daemon::state::AppState,
) -> (std::net::SocketAddr, tokio::task::JoinHandle<()>) {
    let app = loadtest_daemon::build_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, handle)
}

#[tokio::test]
async fn stream_delivers_progress_then_exactly_one_terminal_event() {
    let state = test_state(4, Duration::from_millis(5));
    let spec_id = insert_quick_spec(&state, "ws-happy");
    let run_id = state.orchestrator.start_run(spec_id).await.expect("start_run");
    let (addr, _server) = spawn_test_server(state).await;

    let url = format!("ws://{addr}/runs/{run_id}/stream");
    let (mut socket, _) = tokio_tungstenite::connect_async(url).await.expect("ws connect");

    let mut saw_terminal = false;
    for _ in 0..200 {
        let Some(Ok(Message::Text(text))) = socket.next().await else { break };
        let event: serde_json::Value = serde_json::from_str(&text).expect("event json");
        if event["type"] == "completed" {
            saw_terminal = true;
            break;
        }
    }
    assert!(saw_terminal, "expected a completed event before the stream closed");

    // The topic closes the socket right after its terminal event.
    let next = socket.next().await;
    assert!(matches!(next, None | Some(Ok(Message::Close(_)))));
}

#[tokio::test]
async fn stream_on_unknown_run_reports_run_not_live_then_closes() {
    let state = test_state(4, Duration::from_secs(3600));
    let (addr, _server) = spawn_test_server(state).await;

    let url = format!("ws://{addr}/runs/{}/stream", loadtest_core::RunId::new());
    let (mut socket, _) = tokio_tungstenite::connect_async(url).await.expect("ws connect");

    let Some(Ok(Message::Text(text))) = socket.next().await else {
        panic!("expected a run_not_live text frame");
    };
    let body: serde_json::Value = serde_json::from_str(&text).expect("event json");
    assert_eq!(body["error"], "run_not_live");

    let next = socket.next().await;
    assert!(matches!(next, None | Some(Ok(Message::Close(_)))));
}

#[tokio::test]
async fn closing_the_client_socket_does_not_hang_the_server_task() {
    let state = test_state(4, Duration::from_secs(3600));
    let spec_id = insert_quick_spec(&state, "ws-disconnect");
    let run_id = state.orchestrator.start_run(spec_id).await.expect("start_run");
    let (addr, _server) = spawn_test_server(state).await;

    let url = format!("ws://{addr}/runs/{run_id}/stream");
    let (mut socket, _) = tokio_tungstenite::connect_async(url).await.expect("ws connect");
    socket.close(None).await.expect("client close");
}
