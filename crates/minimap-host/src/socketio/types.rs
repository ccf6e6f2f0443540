//! Configuration, event and command types for the host connection.

use std::time::Duration;

use serde_json::Value;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// How to reach the host's Socket.IO server.
#[derive(Clone)]
pub struct HostConfig {
    /// Full WebSocket URL including the Engine.IO query string.
    pub url: String,
    /// Optional auth payload sent with the Socket.IO connect packet.
    pub auth: Option<Value>,
    /// Upper bound for the WebSocket + Engine.IO + Socket.IO handshake.
    pub handshake_timeout: Duration,
}

impl HostConfig {
    /// Host listening on the loopback interface.
    pub fn local(port: u16) -> Self {
        Self {
            url: format!("ws://127.0.0.1:{port}/socket.io/?EIO=4&transport=websocket"),
            auth: None,
            handshake_timeout: Duration::from_secs(15),
        }
    }
}

impl std::fmt::Debug for HostConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostConfig")
            .field("url", &self.url)
            .field("auth", &self.auth.as_ref().map(|_| "[REDACTED]"))
            .field("handshake_timeout", &self.handshake_timeout)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Events & Commands
// ---------------------------------------------------------------------------

/// Events surfaced by the connection task, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// Socket.IO handshake completed.
    Connected { sid: String },
    /// A named event from the host. `ack` is set when the host expects a
    /// reply via [`HostCommand::Ack`].
    Message {
        name: String,
        args: Vec<Value>,
        ack: Option<u64>,
    },
    /// The connection is gone. Always the last event.
    Disconnected { reason: String },
    /// Non-fatal problem (e.g. a malformed frame).
    Error(String),
}

/// Commands sent from the application to the connection task.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    Emit { event: String, args: Vec<Value> },
    Ack { id: u64, args: Vec<Value> },
    Disconnect,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_url_targets_loopback_websocket_transport() {
        let config = HostConfig::local(14235);
        assert_eq!(
            config.url,
            "ws://127.0.0.1:14235/socket.io/?EIO=4&transport=websocket"
        );
        assert!(config.auth.is_none());
        assert_eq!(config.handshake_timeout, Duration::from_secs(15));
    }

    #[test]
    fn debug_redacts_auth() {
        let config = HostConfig {
            auth: Some(serde_json::json!({ "token": "secret" })),
            ..HostConfig::local(1)
        };
        let dbg = format!("{config:?}");
        assert!(dbg.contains("[REDACTED]"));
        assert!(!dbg.contains("secret"));
    }
}
