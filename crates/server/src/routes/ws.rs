// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Real-time session transport.
//!
//! Clients send `{op:"join", room}` / `{op:"leave", room}`; the server
//! pushes event envelopes `{room, type, payload, ts}`. One session maps to
//! one bus registration; closing the socket tears the session down.

use crate::state::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use joule_core::SessionId;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum ClientOp {
    Join { room: String },
    Leave { room: String },
}

pub(crate) async fn upgrade(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let session = SessionId::new();
    let queue = state.bus.register_session(session.clone());
    tracing::debug!(%session, "session connected");

    let (mut sender, mut receiver) = socket.split();

    // Writer half: drain the session's outbound queue onto the socket.
    let writer = tokio::spawn(async move {
        while let Some(envelope) = queue.recv().await {
            let Ok(text) = serde_json::to_string(&envelope) else {
                continue;
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    });

    // Reader half: membership ops until the client goes away.
    while let Some(Ok(message)) = receiver.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientOp>(&text) {
                Ok(ClientOp::Join { room }) => state.bus.join(&session, &room),
                Ok(ClientOp::Leave { room }) => state.bus.leave(&session, &room),
                Err(e) => {
                    tracing::debug!(%session, error = %e, "ignoring malformed client op");
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    // Closing the session closes the queue, which ends the writer.
    state.bus.close_session(&session);
    let _ = writer.await;
    tracing::debug!(%session, "session closed");
}
