//! # clipqueue
//!
//! `clipqueue` is a leaderless, peer-to-peer replicated message queue for a
//! video wall. Every node holds a full copy of the queue, replicates its own
//! changes to the peers it is connected to over WebSockets, and can put a
//! message on the wall by sending OSC commands over UDP.
//!
//! ## Core Modules
//!
//! - `queue`: The message list, reconciliation rules, expiration timers and the actor that serializes them.
//! - `peer`: Identities of this node and of connected peers.
//! - `transport`: WebSocket links, handshake, seed redial and UDP discovery.
//! - `display`: OSC encoding and the clip rotation on the wall.
//! - `console`: The operator's line-oriented interface.
//! - `node`: Assembles the pieces into a running replica.
//! - `config`: Handles loading settings from files and the environment.
//! - `utils`: Shared error type and logging setup.

pub mod config;
pub mod console;
pub mod display;
pub mod node;
pub mod peer;
pub mod queue;
pub mod transport;
pub mod utils;

#[cfg(test)]
mod tests;
