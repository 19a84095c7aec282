//! The `peer` module models the other devices this node is connected to.
//!
//! A `Peer` is one live WebSocket connection: its identity (announced in the
//! handshake) and the channel used to push frames to it. `PeerSet` is the
//! shared map of connected peers and the queue's default `PeerTransport`.

pub mod peer_set;

pub use peer_set::{LocalPeer, Peer, PeerId, PeerSet};

#[cfg(test)]
mod tests;
