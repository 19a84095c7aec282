//! Error types for `clipqueue`.
//!
//! Validation failures are the only errors surfaced to an end user. Lookup
//! misses are not errors at all (handlers return `None`), and transport or
//! decode failures are logged where they happen and never abort the queue.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum QueueError {
    /// Message address did not start with the protocol marker.
    #[error("invalid address '{0}': must start with '/'")]
    InvalidAddress(String),

    #[error("invalid setting: {0}")]
    InvalidSetting(String),

    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// Malformed or unserializable JSON payload.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("peer {0} is already connected")]
    DuplicatePeer(Uuid),

    #[error("refusing connection to self")]
    SelfConnection,

    #[error("queue actor has stopped")]
    ActorClosed,

    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
