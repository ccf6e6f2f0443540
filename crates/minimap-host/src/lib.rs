//! Connection to the host application's real-time channel.
//!
//! The host runs a Socket.IO server on localhost. This crate speaks just
//! enough of Engine.IO v4 / Socket.IO v5 over a WebSocket to emit events,
//! receive named events, answer acknowledgement requests and keep the
//! connection alive. Inbound events are routed to handlers by name through
//! an [`EventRouter`].

pub mod protocol;
pub mod router;
pub mod socketio;

pub use protocol::{
    events, opacity_args, ElementDescriptor, PayloadError, ELEMENT_KEY, ELEMENT_TYPE_WEB_VIEW,
};
pub use router::{Dispatch, EventRouter, HandlerResult};
pub use socketio::{HostClient, HostCommand, HostConfig, HostEvent};
