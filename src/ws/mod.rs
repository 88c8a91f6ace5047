//! WebSocket transport module
//!
//! One connection per client, with protocol-level ping/pong keepalive.
//! Reconnection policy lives with the caller, not here.

mod client;
mod types;

pub use client::{WsClient, WsConnection};
pub use types::{WsConfig, WsError, WsMessage};
