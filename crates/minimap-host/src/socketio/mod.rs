//! Minimal Socket.IO client over `tokio-tungstenite`.
//!
//! Handles the Engine.IO handshake, server pings, default-namespace events
//! and acknowledgements. Binary packets, namespaces other than `/`,
//! long-polling and reconnection are not supported.

mod client;
mod connection;
pub mod packet;
mod types;


pub use client::HostClient;
pub use packet::{EnginePacket, OpenInfo, PacketError, SocketPacket};
pub use types::{HostCommand, HostConfig, HostEvent};
