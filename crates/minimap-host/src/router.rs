//! Name-based dispatch of inbound host events.
//!
//! Handlers are plain closures over the caller's state `S`. The router runs
//! them on the caller's task, one event at a time, so `S` needs no locking.

use std::collections::HashMap;

use serde_json::Value;

use crate::protocol::PayloadError;

/// What a handler returns: an optional acknowledgement reply, or a
/// payload error that the router logs.
pub type HandlerResult = Result<Option<Value>, PayloadError>;

type Handler<S> = Box<dyn Fn(&mut S, &[Value]) -> HandlerResult + Send + Sync>;

/// Outcome of [`EventRouter::dispatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// A handler ran. Carries its reply, if any.
    Handled(Option<Value>),
    /// A handler ran but rejected the payload. State is unchanged.
    Malformed(PayloadError),
    /// No handler is registered for the event name.
    Unhandled,
}

/// Routes inbound events to handlers by event name.
pub struct EventRouter<S> {
    handlers: HashMap<&'static str, Handler<S>>,
}

impl<S> EventRouter<S> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register `handler` for `event`. A second registration for the same
    /// name replaces the first.
    pub fn on<F>(mut self, event: &'static str, handler: F) -> Self
    where
        F: Fn(&mut S, &[Value]) -> HandlerResult + Send + Sync + 'static,
    {
        if self.handlers.insert(event, Box::new(handler)).is_some() {
            tracing::debug!(event, "Handler replaced");
        }
        self
    }

    pub fn handles(&self, event: &str) -> bool {
        self.handlers.contains_key(event)
    }

    /// Run the handler for `event`, if any.
    pub fn dispatch(&self, state: &mut S, event: &str, args: &[Value]) -> Dispatch {
        let Some(handler) = self.handlers.get(event) else {
            tracing::debug!(event, "No handler for host event");
            return Dispatch::Unhandled;
        };

        match handler(state, args) {
            Ok(reply) => Dispatch::Handled(reply),
            Err(e) => {
                tracing::warn!(event, error = %e, "Malformed payload, ignored");
                Dispatch::Malformed(e)
            }
        }
    }
}

impl<S> Default for EventRouter<S> {
    fn default() -> Self {
        Self::new()
    }
}
