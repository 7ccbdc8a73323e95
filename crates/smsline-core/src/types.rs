use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One inbound text message as stored and streamed to clients.
///
/// Wire: `{ "id": "SM123", "from": "+15551234567", "body": "hi", "timestamp": 1700000000000 }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Provider message id (Twilio `MessageSid`), or a local id when absent.
    pub id: String,
    /// Sender phone number exactly as the provider reported it (unvalidated).
    pub from: String,
    pub body: String,
    /// Arrival time, milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Message {
    /// Build a message stamped with the current wall-clock time.
    pub fn received(id: impl Into<String>, from: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            body: body.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Id used when the provider did not send one.
    pub fn local_id() -> String {
        format!("local-{}", Uuid::new_v4())
    }
}

/// Per-connection identifier (random UUID, not persisted).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnId(pub String);

impl ConnId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
