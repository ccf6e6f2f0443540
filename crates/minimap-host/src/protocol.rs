//! Event names, the element descriptor and inbound payload parsing.
//!
//! The host sends positional Socket.IO arguments. Everything here turns a
//! raw `&[Value]` into a typed value or a [`PayloadError`]; handlers never
//! index into JSON themselves.

use minimap_common::{Bound, BoundUpdate, ModeFlags, SessionContext};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Key of the single element this client owns.
pub const ELEMENT_KEY: &str = "view-1";

/// Element type tag for a web-content view.
pub const ELEMENT_TYPE_WEB_VIEW: u8 = 1;

/// Wire event names.
pub mod events {
    // -- outbound --
    pub const REGISTER_TOPIC: &str = "register_topic";
    /// "Add element". The host uses the same name to announce additions.
    pub const ADD_ELEMENT: &str = "update_elem";
    pub const SHOW_ELEMENT: &str = "show_view";
    pub const HIDE_ELEMENT: &str = "hide_view";
    pub const SET_OPACITY: &str = "set_opacity";
    pub const ECHO: &str = "echo";

    // -- inbound --
    pub const ELEMENT_ADDED: &str = "update_elem";
    pub const ELEMENT_REMOVED: &str = "remove_elem";
    pub const UPDATE_BOUND: &str = "update_bound";
    pub const UPDATE_OPACITY: &str = "update_opacity";
    pub const MODE_FLAG: &str = "mode_flag";
    pub const ELEM_REMOVE: &str = "elem_remove";
    pub const ELEM_REFRESH: &str = "elem_refresh";
    pub const NOTIFY: &str = "notify";
    pub const PROCESS_CONTENT: &str = "process_content";

    /// Inbound events that are only logged.
    pub const INFORMATIONAL: &[&str] = &[
        ECHO,
        NOTIFY,
        PROCESS_CONTENT,
        REGISTER_TOPIC,
        "hook_input",
        "insert_css",
        "remove_css",
        SHOW_ELEMENT,
        HIDE_ELEMENT,
        "exec_js_in_elem",
    ];
}

// ---------------------------------------------------------------------------
// Element Descriptor
// ---------------------------------------------------------------------------

/// The element as the host sees it: `{key, type, bound, content}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDescriptor {
    pub key: String,
    #[serde(rename = "type")]
    pub kind: u8,
    pub bound: Bound,
    pub content: String,
}

impl ElementDescriptor {
    /// The minimap web view at `bound` showing `content`.
    pub fn web_view(bound: Bound, content: &str) -> Self {
        Self {
            key: ELEMENT_KEY.to_string(),
            kind: ELEMENT_TYPE_WEB_VIEW,
            bound,
            content: content.to_string(),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// `[ctx, descriptor]`, the argument list for add/show/hide.
    pub fn args(&self, ctx: &SessionContext) -> Vec<Value> {
        vec![ctx.to_value(), self.to_value()]
    }
}

/// `[ctx, key, opacity]` for `set_opacity`.
pub fn opacity_args(ctx: &SessionContext, key: &str, opacity: f64) -> Vec<Value> {
    vec![ctx.to_value(), Value::from(key), Value::from(opacity)]
}

// ---------------------------------------------------------------------------
// Inbound Payloads
// ---------------------------------------------------------------------------

/// Inbound payload that does not have the expected shape.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PayloadError {
    #[error("missing argument {index} ({what})")]
    Missing { index: usize, what: &'static str },

    #[error("argument {index} should be {expected}, got {got}")]
    WrongType {
        index: usize,
        expected: &'static str,
        got: String,
    },

    #[error("bound field `{0}` is not a number")]
    BadBoundField(&'static str),

    #[error("bound carries no geometry")]
    EmptyBound,

    #[error("opacity {0} outside [0, 1]")]
    OpacityOutOfRange(f64),
}

fn arg<'a>(args: &'a [Value], index: usize, what: &'static str) -> Result<&'a Value, PayloadError> {
    args.get(index).ok_or(PayloadError::Missing { index, what })
}

fn wrong(index: usize, expected: &'static str, got: &Value) -> PayloadError {
    let mut got = got.to_string();
    got.truncate(64);
    PayloadError::WrongType {
        index,
        expected,
        got,
    }
}

/// Element key at `index`. Accepts a bare string or an object with `key`.
pub fn parse_key(args: &[Value], index: usize) -> Result<String, PayloadError> {
    let value = arg(args, index, "element key")?;
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Object(map) => match map.get("key") {
            Some(Value::String(s)) => Ok(s.clone()),
            _ => Err(wrong(index, "an element key", value)),
        },
        other => Err(wrong(index, "an element key", other)),
    }
}

/// `update_bound`: `(key, type, bound)` or `(key, bound)`.
///
/// Fractional coordinates are rounded to the nearest integer.
pub fn parse_bound_update(args: &[Value]) -> Result<(String, BoundUpdate), PayloadError> {
    let key = parse_key(args, 0)?;
    let index = if args.len() >= 3 { 2 } else { 1 };
    let value = arg(args, index, "bound")?;
    let map = value
        .as_object()
        .ok_or_else(|| wrong(index, "a bound object", value))?;

    let field = |name: &'static str| -> Result<Option<i64>, PayloadError> {
        match map.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => v
                .as_i64()
                .or_else(|| v.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64))
                .map(Some)
                .ok_or(PayloadError::BadBoundField(name)),
        }
    };

    let update = BoundUpdate {
        x: field("x")?,
        y: field("y")?,
        w: field("w")?,
        h: field("h")?,
    };
    if update.is_empty() {
        return Err(PayloadError::EmptyBound);
    }
    Ok((key, update))
}

/// `update_opacity`: `(key, opacity)`.
pub fn parse_opacity_update(args: &[Value]) -> Result<(String, f64), PayloadError> {
    let key = parse_key(args, 0)?;
    let value = arg(args, 1, "opacity")?;
    let opacity = value.as_f64().ok_or_else(|| wrong(1, "a number", value))?;
    if !(0.0..=1.0).contains(&opacity) {
        return Err(PayloadError::OpacityOutOfRange(opacity));
    }
    Ok((key, opacity))
}

/// `mode_flag`: `(lock, move, dev)` or a single `{lock, move, dev}` object.
pub fn parse_mode_flags(args: &[Value]) -> Result<ModeFlags, PayloadError> {
    let first = arg(args, 0, "lock flag")?;
    if first.is_object() {
        return ModeFlags::deserialize(first).map_err(|_| wrong(0, "{lock, move, dev}", first));
    }

    let flag = |index: usize, what: &'static str| -> Result<bool, PayloadError> {
        let value = arg(args, index, what)?;
        value.as_bool().ok_or_else(|| wrong(index, "a boolean", value))
    };

    Ok(ModeFlags {
        lock: flag(0, "lock flag")?,
        moving: flag(1, "move flag")?,
        dev: flag(2, "dev flag")?,
    })
}
