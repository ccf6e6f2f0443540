use serde::{Deserialize, Serialize};
use std::fmt;

/// Generate a fresh random credential (UUID v4, hyphenated).
pub fn new_credential() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Per-connection context that scopes every emit to this client's channel.
///
/// Sent as the first argument of every outbound event. A new credential is
/// generated for each registration so that two instances sharing one host
/// never collide.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionContext {
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pwd: Option<String>,
}

impl SessionContext {
    /// Context for `topic` with a freshly generated credential.
    pub fn fresh(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            pwd: Some(new_credential()),
        }
    }

    /// Context without a credential.
    pub fn open(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            pwd: None,
        }
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("topic", &self.topic)
            .field("pwd", &self.pwd.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl fmt::Display for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.topic)
    }
}
