use crate::traits::{LiveSocketError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message kinds exchanged over the realtime socket
///
/// `ping`/`pong` are control messages: they are handled by the connection
/// loop and never reach generic listeners. Kinds this client does not know
/// about deserialize into [`MessageKind::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    GenerationUpdate,
    DeploymentUpdate,
    Notification,
    Ping,
    Pong,
    #[serde(other)]
    Unknown,
}

impl MessageKind {
    /// Control messages are intercepted before generic fan-out
    pub fn is_control(&self) -> bool {
        matches!(self, MessageKind::Ping | MessageKind::Pong)
    }
}

/// The typed message wrapper exchanged over the transport
///
/// The timestamp is authored by the sender at construction time; the
/// receiver never sets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Envelope {
    /// Create an envelope stamped with the current time
    pub fn new(kind: MessageKind, data: Value) -> Self {
        Self {
            kind,
            data,
            timestamp: Utc::now(),
            user_id: None,
        }
    }

    /// A `ping` control envelope
    pub fn ping() -> Self {
        Self::new(MessageKind::Ping, Value::Null)
    }

    /// A `pong` control envelope
    pub fn pong() -> Self {
        Self::new(MessageKind::Pong, Value::Null)
    }

    /// Attach a user id to the envelope
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Serialize to the JSON wire form
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| LiveSocketError::Parse(e.to_string()))
    }
}
