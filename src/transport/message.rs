use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Transport-level frames that are not replication payloads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum HandshakeMessage {
    #[serde(rename = "hello")]
    Hello { peer_id: Uuid, name: String },
}

/// UDP discovery beacon: "peer `peer_id` accepts WebSockets on `port`".
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Beacon {
    pub peer_id: Uuid,
    pub port: u16,
}
