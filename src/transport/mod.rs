//! The `transport` module connects queue replicas to each other.
//!
//! Every peer link is a WebSocket carrying UTF-8 JSON text frames. The first
//! frame in each direction is a `hello` handshake naming the sender; every
//! later frame is an opaque replication payload handed to the queue actor.
//! Peers are found through static seed URLs and UDP broadcast beacons.
//!
//! The queue only depends on `PeerTransport` (outbound) and `PeerEvent`
//! (inbound); reconnect and backoff policy stay entirely in here.

pub mod discovery;
pub mod message;
pub mod websocket;

pub use message::HandshakeMessage;
pub use websocket::{Backoff, Direction, Endpoint, dial, maintain_seed, start_peer_listener};

use crate::peer::PeerId;

/// Connection lifecycle and inbound payloads, delivered to the queue actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    Connected(PeerId),
    Disconnected(PeerId),
    Message { peer_id: PeerId, text: String },
}

/// Outbound side used by the queue engine. Fire-and-forget: implementations
/// log delivery failures and never block.
pub trait PeerTransport: Send + Sync {
    /// Send to every connected peer. With nobody connected the payload is
    /// dropped.
    fn broadcast(&self, raw: &str);

    fn send_to(&self, peer: &PeerId, raw: &str);
}
