//! WebSocket endpoint for live reload.
//!
//! Each upgraded connection becomes a session: the server greets it with
//! `connected`, the client answers with a `handshake` naming its URL, and a
//! writer task drains the session's frame channel onto the socket. Closing
//! the socket (either side) unregisters the session.

use crate::state::SharedState;
use arbor_core::ReloadMessage;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};

pub async fn handle_upgrade(
    State(state): State<SharedState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_session(socket, state))
}

async fn handle_session(socket: WebSocket, state: SharedState) {
    let (id, mut frames) = state.sessions.register();
    let (mut sink, mut stream) = socket.split();

    if sink
        .send(Message::Text(ReloadMessage::Connected.to_json().into()))
        .await
        .is_err()
    {
        state.sessions.unregister(id);
        return;
    }
    tracing::info!(session = id, "live-reload session connected");

    let writer = tokio::spawn(async move {
        while let Some(frame) = frames.recv().await {
            if sink
                .send(Message::Text(frame.to_json().into()))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        if let Message::Text(text) = message {
            match ReloadMessage::from_json(&text) {
                Ok(ReloadMessage::Handshake { url }) => {
                    tracing::debug!(session = id, url = %url, "handshake");
                    state.sessions.set_url(id, url);
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::debug!(session = id, "ignoring malformed frame: {err}");
                }
            }
        }
    }

    state.sessions.unregister(id);
    writer.abort();
    tracing::info!(session = id, "live-reload session closed");
}
