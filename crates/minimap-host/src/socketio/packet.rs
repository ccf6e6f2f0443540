//! Engine.IO v4 / Socket.IO v5 text packet codec.
//!
//! Engine.IO frames one packet per WebSocket text message, prefixed with a
//! single type digit. Socket.IO packets ride inside Engine.IO `message`
//! packets:
//!
//! ```text
//! <type>[<namespace>,][<ack id>][<json>]
//! ```
//!
//! Only the default namespace and text packets are supported.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PacketError {
    #[error("empty packet")]
    Empty,

    #[error("unknown engine packet type {0:?}")]
    UnknownEngineType(char),

    #[error("unknown socket packet type {0:?}")]
    UnknownSocketType(char),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("invalid json: {0}")]
    InvalidJson(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

/// Handshake data sent by the server in the Engine.IO `open` packet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenInfo {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Milliseconds between server pings.
    pub ping_interval: u64,
    /// Milliseconds the server waits for a pong.
    pub ping_timeout: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_payload: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(OpenInfo),
    Close,
    Ping(String),
    Pong(String),
    Message(SocketPacket),
    Upgrade,
    Noop,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect(Option<Value>),
    Disconnect,
    Event {
        id: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    Ack {
        id: u64,
        args: Vec<Value>,
    },
    ConnectError(Value),
}

impl EnginePacket {
    pub fn decode(text: &str) -> Result<Self, PacketError> {
        let mut chars = text.chars();
        let kind = chars.next().ok_or(PacketError::Empty)?;
        let body = chars.as_str();

        match kind {
            '0' => serde_json::from_str(body)
                .map(EnginePacket::Open)
                .map_err(|e| PacketError::InvalidJson(e.to_string())),
            '1' => Ok(EnginePacket::Close),
            '2' => Ok(EnginePacket::Ping(body.to_string())),
            '3' => Ok(EnginePacket::Pong(body.to_string())),
            '4' => SocketPacket::decode(body).map(EnginePacket::Message),
            '5' => Ok(EnginePacket::Upgrade),
            '6' => Ok(EnginePacket::Noop),
            other => Err(PacketError::UnknownEngineType(other)),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            EnginePacket::Open(info) => {
                format!("0{}", serde_json::to_string(info).unwrap_or_default())
            }
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping(data) => format!("2{data}"),
            EnginePacket::Pong(data) => format!("3{data}"),
            EnginePacket::Message(packet) => format!("4{}", packet.encode()),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        }
    }
}

impl SocketPacket {
    pub fn event(name: &str, args: Vec<Value>) -> Self {
        SocketPacket::Event {
            id: None,
            name: name.to_string(),
            args,
        }
    }

    pub fn decode(body: &str) -> Result<Self, PacketError> {
        let mut chars = body.chars();
        let kind = chars.next().ok_or(PacketError::Empty)?;
        let rest = chars.as_str();

        if matches!(kind, '5' | '6') {
            return Err(PacketError::Unsupported("binary packets".into()));
        }

        let rest = strip_namespace(rest)?;

        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let id = if digits > 0 {
            Some(
                rest[..digits]
                    .parse::<u64>()
                    .map_err(|e| PacketError::InvalidPayload(format!("ack id: {e}")))?,
            )
        } else {
            None
        };

        let data = &rest[digits..];
        let json = if data.is_empty() {
            None
        } else {
            Some(
                serde_json::from_str::<Value>(data)
                    .map_err(|e| PacketError::InvalidJson(e.to_string()))?,
            )
        };

        match kind {
            '0' => Ok(SocketPacket::Connect(json)),
            '1' => Ok(SocketPacket::Disconnect),
            '2' => {
                let mut items = match json {
                    Some(Value::Array(items)) => items,
                    _ => {
                        return Err(PacketError::InvalidPayload(
                            "event data must be an array".into(),
                        ))
                    }
                };
                if items.is_empty() {
                    return Err(PacketError::InvalidPayload("event without a name".into()));
                }
                let name = match items.remove(0) {
                    Value::String(name) => name,
                    other => {
                        return Err(PacketError::InvalidPayload(format!(
                            "event name must be a string, got {other}"
                        )))
                    }
                };
                Ok(SocketPacket::Event {
                    id,
                    name,
                    args: items,
                })
            }
            '3' => {
                let id = id.ok_or_else(|| PacketError::InvalidPayload("ack without id".into()))?;
                let args = match json {
                    Some(Value::Array(items)) => items,
                    None => Vec::new(),
                    Some(_) => {
                        return Err(PacketError::InvalidPayload(
                            "ack data must be an array".into(),
                        ))
                    }
                };
                Ok(SocketPacket::Ack { id, args })
            }
            '4' => Ok(SocketPacket::ConnectError(json.unwrap_or(Value::Null))),
            other => Err(PacketError::UnknownSocketType(other)),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            SocketPacket::Connect(None) => "0".to_string(),
            SocketPacket::Connect(Some(auth)) => format!("0{auth}"),
            SocketPacket::Disconnect => "1".to_string(),
            SocketPacket::Event { id, name, args } => {
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(Value::String(name.clone()));
                items.extend(args.iter().cloned());
                let id = id.map(|i| i.to_string()).unwrap_or_default();
                format!("2{id}{}", Value::Array(items))
            }
            SocketPacket::Ack { id, args } => format!("3{id}{}", Value::Array(args.clone())),
            SocketPacket::ConnectError(data) => format!("4{data}"),
        }
    }
}

/// Skip an explicit namespace prefix. Anything but `/` is rejected.
fn strip_namespace(rest: &str) -> Result<&str, PacketError> {
    if !rest.starts_with('/') {
        return Ok(rest);
    }
    let (nsp, tail) = match rest.find(',') {
        Some(i) => (&rest[..i], &rest[i + 1..]),
        None => (rest, ""),
    };
    if nsp == "/" {
        Ok(tail)
    } else {
        Err(PacketError::Unsupported(format!("namespace {nsp}")))
    }
}
