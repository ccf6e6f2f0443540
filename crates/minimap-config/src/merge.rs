//! Per-key reconciliation of a loaded settings value against the defaults.

use serde_json::{Map, Value};

use crate::schema::Configuration;

/// JSON shape a canonical key must have to be accepted as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
    Boolean,
    StringList,
    /// A number in `[0.0, 1.0]`.
    UnitFloat,
}

impl ValueKind {
    pub fn matches(self, value: &Value) -> bool {
        match self {
            ValueKind::Integer => value.is_i64(),
            ValueKind::Boolean => value.is_boolean(),
            ValueKind::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            ValueKind::UnitFloat => value
                .as_f64()
                .is_some_and(|f| (0.0..=1.0).contains(&f)),
        }
    }
}

/// Every key of the settings record with its expected shape.
pub const CANONICAL_KEYS: &[(&str, ValueKind)] = &[
    ("x", ValueKind::Integer),
    ("y", ValueKind::Integer),
    ("w", ValueKind::Integer),
    ("h", ValueKind::Integer),
    ("debug", ValueKind::Boolean),
    ("url", ValueKind::StringList),
    ("index", ValueKind::Integer),
    ("opacity", ValueKind::UnitFloat),
];

/// Result of [`merge`].
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub config: Configuration,
    /// Keys that were missing or mistyped and got their default.
    pub repaired: Vec<&'static str>,
}

/// Reconcile `loaded` against `defaults`, key by key.
///
/// Keys with the expected shape keep their loaded value; missing or
/// mistyped keys take the default. Unknown keys are dropped. A non-object
/// `loaded` repairs every key.
pub fn merge(loaded: &Value, defaults: &Configuration) -> MergeOutcome {
    let default_value = serde_json::to_value(defaults).unwrap_or(Value::Null);
    let default_map = default_value.as_object();
    let loaded_map = loaded.as_object();

    let mut merged = Map::new();
    let mut repaired = Vec::new();

    for (key, kind) in CANONICAL_KEYS {
        match loaded_map.and_then(|m| m.get(*key)) {
            Some(value) if kind.matches(value) => {
                merged.insert((*key).to_string(), value.clone());
            }
            _ => {
                let fallback = default_map
                    .and_then(|m| m.get(*key))
                    .cloned()
                    .unwrap_or(Value::Null);
                merged.insert((*key).to_string(), fallback);
                repaired.push(*key);
            }
        }
    }

    let config = match serde_json::from_value::<Configuration>(Value::Object(merged)) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("merged settings did not deserialize ({e}), using defaults");
            return MergeOutcome {
                config: defaults.clone(),
                repaired: CANONICAL_KEYS.iter().map(|(k, _)| *k).collect(),
            };
        }
    };

    MergeOutcome { config, repaired }
}
