//! WebSocket Message Types
//!
//! Defines the message types for WebSocket communication between
//! dashboard clients and the StorePulse server.

use serde::{Deserialize, Serialize};

use crate::analytics::MetricsSnapshot;
use crate::api::dto::SnapshotResponse;

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection established
    Connected {
        /// Unique connection identifier
        connection_id: String,
    },
    /// A new metrics snapshot was published
    Snapshot {
        /// The published metrics
        metrics: SnapshotResponse,
    },
    /// Pong response to ping
    Pong,
    /// Error message
    Error {
        /// Error description
        message: String,
    },
}

impl ServerMessage {
    /// Build a snapshot message from published metrics
    pub fn snapshot(metrics: &MetricsSnapshot) -> Self {
        ServerMessage::Snapshot {
            metrics: SnapshotResponse::from(metrics),
        }
    }
}
