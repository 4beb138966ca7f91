//! WebSocket streaming
//!
//! Pushes every published metrics snapshot to connected dashboard
//! clients. The handler bridges the engine's snapshot bus onto an Axum
//! WebSocket connection.

pub mod handler;
pub mod messages;

pub use handler::websocket_handler;
pub use messages::{ClientMessage, ServerMessage};
