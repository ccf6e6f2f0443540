//! Public handle for the host connection.

use serde_json::Value;
use tokio::sync::mpsc;

use super::connection::connection_task;
use super::types::{HostCommand, HostConfig, HostEvent};

/// Handle for talking to the host.
///
/// Cheap to clone via [`HostClient::clone_sender`]; every clone feeds the
/// same ordered command queue, so emits from different tasks reach the
/// host in the order they were queued.
///
/// The command queue is unbounded. The connection task may wait on the
/// event channel, and a full command queue would then stall whoever is
/// draining events.
pub struct HostClient {
    command_tx: mpsc::UnboundedSender<HostCommand>,
}

impl HostClient {
    /// Open the connection in a background task.
    /// Returns `(client, event_receiver)`.
    pub fn connect(config: HostConfig) -> (Self, mpsc::Receiver<HostEvent>) {
        let (event_tx, event_rx) = mpsc::channel(256);
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        tokio::spawn(connection_task(config, event_tx, command_rx));

        (Self { command_tx }, event_rx)
    }

    /// A client with no connection behind it. Commands land in the
    /// returned receiver, which lets callers drive or inspect the
    /// outbound stream directly.
    pub fn detached() -> (Self, mpsc::UnboundedReceiver<HostCommand>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        (Self { command_tx }, command_rx)
    }

    pub fn clone_sender(&self) -> Self {
        Self {
            command_tx: self.command_tx.clone(),
        }
    }

    /// Emit a named event. Fire-and-forget.
    pub async fn emit(&self, event: &str, args: Vec<Value>) {
        let cmd = HostCommand::Emit {
            event: event.to_string(),
            args,
        };
        if self.command_tx.send(cmd).is_err() {
            tracing::debug!(event, "emit dropped, connection task is gone");
        }
    }

    /// Answer a host request that carried an acknowledgement id.
    pub async fn ack(&self, id: u64, args: Vec<Value>) {
        if self.command_tx.send(HostCommand::Ack { id, args }).is_err() {
            tracing::debug!(id, "ack dropped, connection task is gone");
        }
    }

    /// Close the connection.
    pub async fn disconnect(&self) {
        let _ = self.command_tx.send(HostCommand::Disconnect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn detached_client_queues_commands_in_order() {
        let (client, mut rx) = HostClient::detached();
        let other = client.clone_sender();

        client.emit("first", vec![json!(1)]).await;
        other.emit("second", vec![]).await;
        client.ack(4, vec![json!(true)]).await;
        client.disconnect().await;

        assert_eq!(
            rx.recv().await,
            Some(HostCommand::Emit {
                event: "first".into(),
                args: vec![json!(1)]
            })
        );
        assert_eq!(
            rx.recv().await,
            Some(HostCommand::Emit {
                event: "second".into(),
                args: vec![]
            })
        );
        assert_eq!(
            rx.recv().await,
            Some(HostCommand::Ack {
                id: 4,
                args: vec![json!(true)]
            })
        );
        assert_eq!(rx.recv().await, Some(HostCommand::Disconnect));
    }

    #[tokio::test]
    async fn queueing_never_waits_on_the_receiver() {
        let (client, mut rx) = HostClient::detached();

        // Nobody reads while these are queued.
        for id in 0..10_000u64 {
            client.ack(id, vec![json!(true)]).await;
        }

        let mut count = 0;
        while let Ok(HostCommand::Ack { id, .. }) = rx.try_recv() {
            assert_eq!(id, count);
            count += 1;
        }
        assert_eq!(count, 10_000);
    }

    #[tokio::test]
    async fn emit_after_receiver_dropped_does_not_panic() {
        let (client, rx) = HostClient::detached();
        drop(rx);
        client.emit("echo", vec![json!("hello")]).await;
    }
}
