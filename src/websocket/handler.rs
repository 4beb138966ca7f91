//! WebSocket Handler
//!
//! Handles WebSocket upgrade requests and streams every published
//! metrics snapshot to the connected client.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::AppState;

use super::messages::{ClientMessage, ServerMessage};

/// WebSocket upgrade handler
///
/// This is the entry point for WebSocket connections. It upgrades the
/// HTTP connection, registers a snapshot listener with the engine, and
/// starts message handling.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an established WebSocket connection
///
/// One loop serves both directions: published snapshots are forwarded to
/// the client, client pings are answered with pongs. The snapshot
/// listener is released on any exit path.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let connection_id = Uuid::new_v4().to_string();
    let mut listener = state.engine.on_snapshot_change().await;

    tracing::info!(connection_id = %connection_id, "WebSocket connected");

    // Greet with the connection id, then the current snapshot so the
    // client never starts blind
    let connected = ServerMessage::Connected {
        connection_id: connection_id.clone(),
    };
    let current = ServerMessage::snapshot(&state.engine.snapshot());
    if send_message(&mut sender, &connected).await.is_err()
        || send_message(&mut sender, &current).await.is_err()
    {
        tracing::debug!(connection_id = %connection_id, "Failed to greet, closing");
        listener.unsubscribe().await;
        return;
    }

    loop {
        tokio::select! {
            snapshot = listener.recv() => {
                let Some(snapshot) = snapshot else { break };
                let msg = ServerMessage::snapshot(&snapshot);
                if send_message(&mut sender, &msg).await.is_err() {
                    tracing::debug!(
                        connection_id = %connection_id,
                        "WebSocket send failed, closing connection"
                    );
                    break;
                }
            }
            incoming = receiver.next() => {
                let Some(Ok(msg)) = incoming else { break };
                match handle_ws_message(&connection_id, msg) {
                    WsAction::Continue => {}
                    WsAction::Pong => {
                        if send_message(&mut sender, &ServerMessage::Pong).await.is_err() {
                            break;
                        }
                    }
                    WsAction::Close => break,
                }
            }
        }
    }

    listener.unsubscribe().await;
    tracing::info!(connection_id = %connection_id, "WebSocket disconnected");
}

/// What to do after one incoming message
enum WsAction {
    Continue,
    Pong,
    Close,
}

/// Serialize and send one server message
async fn send_message(
    sender: &mut SplitSink<WebSocket, Message>,
    message: &ServerMessage,
) -> Result<(), axum::Error> {
    match serde_json::to_string(message) {
        Ok(text) => sender.send(Message::Text(text)).await,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize message");
            Ok(())
        }
    }
}

/// Handle a received WebSocket message
///
/// Protocol-level ping/pong frames are handled by axum itself; the JSON
/// ping is an application keepalive for clients that cannot send frames.
fn handle_ws_message(connection_id: &str, message: Message) -> WsAction {
    match message {
        Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
            Ok(ClientMessage::Ping) => WsAction::Pong,
            Err(e) => {
                tracing::debug!(
                    connection_id = %connection_id,
                    error = %e,
                    text = %text,
                    "Invalid client message"
                );
                WsAction::Continue
            }
        },
        Message::Binary(_) => {
            // Binary messages are not part of the protocol
            WsAction::Continue
        }
        Message::Ping(_) | Message::Pong(_) => WsAction::Continue,
        Message::Close(_) => {
            tracing::debug!(connection_id = %connection_id, "Client requested close");
            WsAction::Close
        }
    }
}
