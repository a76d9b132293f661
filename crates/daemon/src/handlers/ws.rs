// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /runs/{runId}/stream` (§6 Subscription surface): upgrades to a
//! WebSocket and forwards [`RunEvent`]s as JSON text frames, in order, until
//! the topic's one terminal event closes the stream.

use crate::state::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use loadtest_core::RunId;

pub async fn stream_run(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> impl IntoResponse {
    let run_id = RunId::from(run_id);
    ws.on_upgrade(move |socket| handle_socket(socket, state, run_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, run_id: RunId) {
    let (mut sink, mut stream) = socket.split();

    let mut subscription = match state.bus.subscribe(run_id) {
        Ok(sub) => sub,
        Err(_) => {
            let _ = sink
                .send(Message::Text(serde_json::json!({"error": "run_not_live"}).to_string()))
                .await;
            let _ = sink.close().await;
            return;
        }
    };

    loop {
        tokio::select! {
            event = subscription.receiver.recv() => {
                let Some(event) = event else { break };
                let Ok(text) = serde_json::to_string(&event) else { break };
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
                if event.is_terminal() {
                    break;
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(_)) => break,
                }
            }
        }
    }

    let _ = sink.close().await;
}
