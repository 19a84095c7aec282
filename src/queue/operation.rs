//! Replication operations exchanged between peers.
//!
//! Wire format (UTF-8 JSON, one operation per WebSocket text frame):
//!
//! ```text
//! { "action": "add" | "update" | "remove",
//!   "message": { "id", "address", "value", "tableNumber", "timestamp", "status" } }
//! ```
//!
//! Every operation carries a full message snapshot; there is no delta
//! encoding and no ordering metadata.

use serde::{Deserialize, Serialize};

use crate::queue::message::Message;
use crate::utils::QueueError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Add,
    Update,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationOp {
    pub action: Action,
    pub message: Message,
}

impl ReplicationOp {
    pub fn add(message: Message) -> Self {
        Self {
            action: Action::Add,
            message,
        }
    }

    pub fn update(message: Message) -> Self {
        Self {
            action: Action::Update,
            message,
        }
    }

    pub fn remove(message: Message) -> Self {
        Self {
            action: Action::Remove,
            message,
        }
    }

    pub fn encode(&self) -> Result<String, QueueError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a payload received from a peer. Any malformed field rejects the
    /// whole operation.
    pub fn decode(raw: &str) -> Result<Self, QueueError> {
        Ok(serde_json::from_str(raw)?)
    }
}
