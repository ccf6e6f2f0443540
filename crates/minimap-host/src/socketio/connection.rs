//! Background task that owns the WebSocket to the host.
//!
//! One session per task: handshake, then a single `select!` loop that
//! forwards commands, answers pings and surfaces inbound events. There is no
//! reconnect; when the session ends a final `Disconnected` event is sent and
//! the task exits.

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use minimap_common::HostError;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, timeout, Duration, Instant};
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tracing::{debug, error, info, warn};

use super::packet::{EnginePacket, OpenInfo, SocketPacket};
use super::types::{HostCommand, HostConfig, HostEvent};

// ---------------------------------------------------------------------------
// Connection Task
// ---------------------------------------------------------------------------

pub(crate) async fn connection_task(
    config: HostConfig,
    event_tx: mpsc::Sender<HostEvent>,
    command_rx: mpsc::UnboundedReceiver<HostCommand>,
) {
    info!(url = %config.url, "Connecting to host");

    let reason = match run_session(&config, &event_tx, command_rx).await {
        Ok(reason) => {
            info!(reason = %reason, "Host connection ended");
            reason
        }
        Err(e) => {
            error!(error = %e, "Host connection failed");
            e.to_string()
        }
    };

    let _ = event_tx.send(HostEvent::Disconnected { reason }).await;
}

async fn run_session(
    config: &HostConfig,
    event_tx: &mpsc::Sender<HostEvent>,
    mut command_rx: mpsc::UnboundedReceiver<HostCommand>,
) -> Result<String, HostError> {
    let (ws, _) = timeout(
        config.handshake_timeout,
        tokio_tungstenite::connect_async(config.url.as_str()),
    )
    .await
    .map_err(|_| {
        HostError::ConnectFailed(format!("timed out after {:?}", config.handshake_timeout))
    })?
    .map_err(|e| HostError::ConnectFailed(e.to_string()))?;

    let (mut sink, mut stream) = ws.split();

    let (open, sid) = timeout(
        config.handshake_timeout,
        handshake(&mut sink, &mut stream, config.auth.clone()),
    )
    .await
    .map_err(|_| HostError::HandshakeFailed("timed out".into()))??;

    // The server pings every `ping_interval`; silence past the timeout
    // means the host is gone.
    let liveness = Duration::from_millis(open.ping_interval + open.ping_timeout);

    info!(sid = %sid, "Connected to host");
    let _ = event_tx.send(HostEvent::Connected { sid }).await;

    let mut deadline = Instant::now() + liveness;

    loop {
        tokio::select! {
            cmd = command_rx.recv() => match cmd {
                Some(HostCommand::Emit { event, args }) => {
                    debug!(event = %event, "Emit");
                    send_packet(
                        &mut sink,
                        EnginePacket::Message(SocketPacket::event(&event, args)),
                    )
                    .await?;
                }
                Some(HostCommand::Ack { id, args }) => {
                    debug!(id, "Ack");
                    send_packet(&mut sink, EnginePacket::Message(SocketPacket::Ack { id, args }))
                        .await?;
                }
                Some(HostCommand::Disconnect) | None => {
                    let bye = EnginePacket::Message(SocketPacket::Disconnect);
                    let _ = send_packet(&mut sink, bye).await;
                    let _ = sink.close().await;
                    return Ok("client disconnect".into());
                }
            },

            _ = sleep_until(deadline) => {
                return Err(HostError::ConnectionClosed(format!(
                    "ping timeout ({} ms without traffic)",
                    liveness.as_millis()
                )));
            }

            frame = stream.next() => {
                deadline = Instant::now() + liveness;
                match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        if let Some(reason) = handle_frame(&text, &mut sink, event_tx).await? {
                            return Ok(reason);
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) => return Ok("host closed the websocket".into()),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(HostError::ConnectionClosed(e.to_string())),
                    None => return Ok("stream ended".into()),
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Handshake
// ---------------------------------------------------------------------------

/// Engine.IO open, then Socket.IO connect. Returns the open info and the
/// socket id assigned by the host.
async fn handshake<S, R>(
    sink: &mut S,
    stream: &mut R,
    auth: Option<Value>,
) -> Result<(OpenInfo, String), HostError>
where
    S: Sink<WsMessage, Error = WsError> + Unpin,
    R: Stream<Item = Result<WsMessage, WsError>> + Unpin,
{
    let open = loop {
        match next_packet(stream).await? {
            EnginePacket::Open(info) => break info,
            other => debug!(?other, "Packet before open"),
        }
    };
    debug!(
        sid = %open.sid,
        ping_interval = open.ping_interval,
        ping_timeout = open.ping_timeout,
        "Engine.IO open"
    );

    send_packet(sink, EnginePacket::Message(SocketPacket::Connect(auth))).await?;

    loop {
        match next_packet(stream).await? {
            EnginePacket::Message(SocketPacket::Connect(data)) => {
                let sid = data
                    .as_ref()
                    .and_then(|d| d.get("sid"))
                    .and_then(|s| s.as_str())
                    .unwrap_or(&open.sid)
                    .to_string();
                return Ok((open, sid));
            }
            EnginePacket::Message(SocketPacket::ConnectError(data)) => {
                return Err(HostError::HandshakeFailed(format!(
                    "host refused connection: {data}"
                )));
            }
            EnginePacket::Ping(data) => send_packet(sink, EnginePacket::Pong(data)).await?,
            other => debug!(?other, "Packet before connect"),
        }
    }
}

async fn next_packet<R>(stream: &mut R) -> Result<EnginePacket, HostError>
where
    R: Stream<Item = Result<WsMessage, WsError>> + Unpin,
{
    loop {
        match stream.next().await {
            Some(Ok(WsMessage::Text(text))) => {
                return EnginePacket::decode(&text)
                    .map_err(|e| HostError::HandshakeFailed(e.to_string()));
            }
            Some(Ok(WsMessage::Close(_))) | None => {
                return Err(HostError::HandshakeFailed("closed during handshake".into()));
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(HostError::HandshakeFailed(e.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// Handle one inbound text frame. Returns a reason when the host ended
/// the session.
async fn handle_frame<S>(
    text: &str,
    sink: &mut S,
    event_tx: &mpsc::Sender<HostEvent>,
) -> Result<Option<String>, HostError>
where
    S: Sink<WsMessage, Error = WsError> + Unpin,
{
    match EnginePacket::decode(text) {
        Ok(EnginePacket::Ping(data)) => {
            send_packet(sink, EnginePacket::Pong(data)).await?;
        }
        Ok(EnginePacket::Message(SocketPacket::Event { id, name, args })) => {
            debug!(event = %name, ack = ?id, "Inbound event");
            let _ = event_tx
                .send(HostEvent::Message {
                    name,
                    args,
                    ack: id,
                })
                .await;
        }
        Ok(EnginePacket::Message(SocketPacket::Disconnect)) => {
            return Ok(Some("host disconnected the socket".into()));
        }
        Ok(EnginePacket::Close) => return Ok(Some("host closed the engine".into())),
        Ok(other) => debug!(?other, "Ignored packet"),
        Err(e) => {
            warn!(error = %e, frame_len = text.len(), "Malformed frame from host");
            let _ = event_tx
                .send(HostEvent::Error(format!("malformed frame: {e}")))
                .await;
        }
    }
    Ok(None)
}

async fn send_packet<S>(sink: &mut S, packet: EnginePacket) -> Result<(), HostError>
where
    S: Sink<WsMessage, Error = WsError> + Unpin,
{
    sink.send(WsMessage::Text(packet.encode().into()))
        .await
        .map_err(|e| HostError::ConnectionClosed(e.to_string()))
}
