//! Connected peer registry
//!
//! `PeerSet` is cheap to clone; every clone shares the same map. It is
//! written to by connection tasks (register on handshake, remove on close)
//! and read by the queue actor through the `PeerTransport` impl. Sends are
//! unbounded channel pushes, so holding the lock never waits on the network.
//!
//! Each `Peer` also carries a link number unique to its connection, so a
//! connection that was superseded cannot unregister its replacement.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};
use tungstenite::protocol::Message as WsMessage;
use uuid::Uuid;

use crate::transport::PeerTransport;

pub type PeerId = Uuid;

static NEXT_LINK: AtomicU64 = AtomicU64::new(0);

/// Identity this node announces to others.
#[derive(Debug, Clone)]
pub struct LocalPeer {
    pub id: PeerId,
    pub name: String,
}

impl LocalPeer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

#[derive(Debug)]
pub struct Peer {
    pub id: PeerId,
    pub name: String,
    pub link: u64,
    pub sender: UnboundedSender<WsMessage>,
}

impl Peer {
    pub fn new(id: PeerId, name: impl Into<String>, sender: UnboundedSender<WsMessage>) -> Self {
        Self {
            id,
            name: name.into(),
            link: NEXT_LINK.fetch_add(1, Ordering::Relaxed),
            sender,
        }
    }

    fn deliver(&self, raw: &str) {
        if let Err(e) = self.sender.send(WsMessage::text(raw.to_owned())) {
            warn!("Failed to send to peer {} ({}): {e}", self.id, self.name);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PeerSet {
    peers: Arc<Mutex<HashMap<PeerId, Peer>>>,
}

impl PeerSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PeerId, Peer>> {
        self.peers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a peer. Returns `false` and leaves the existing entry in place if
    /// a peer with the same id is already connected.
    pub fn register(&self, peer: Peer) -> bool {
        self.register_link(peer, false)
    }

    /// Add a peer, or with `replace` set, supersede an existing link to the
    /// same peer. Dropping the old entry closes its channel, which ends that
    /// connection's send loop.
    pub fn register_link(&self, peer: Peer, replace: bool) -> bool {
        let mut peers = self.lock();
        if let Some(existing) = peers.get(&peer.id) {
            if !replace {
                return false;
            }
            debug!(
                "Link {} to peer {} superseded by link {}",
                existing.link, peer.id, peer.link
            );
        }
        debug!("Registered peer {} ({})", peer.id, peer.name);
        peers.insert(peer.id, peer);
        true
    }

    pub fn remove(&self, id: &PeerId) -> Option<Peer> {
        self.lock().remove(id)
    }

    /// Remove `id` only while `link` is still its registered connection.
    pub fn remove_link(&self, id: &PeerId, link: u64) -> bool {
        let mut peers = self.lock();
        if peers.get(id).is_some_and(|peer| peer.link == link) {
            peers.remove(id);
            return true;
        }
        false
    }

    pub fn contains(&self, id: &PeerId) -> bool {
        self.lock().contains_key(id)
    }

    pub fn ids(&self) -> Vec<PeerId> {
        self.lock().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl PeerTransport for PeerSet {
    fn broadcast(&self, raw: &str) {
        let peers = self.lock();
        if peers.is_empty() {
            debug!("No peers connected, payload not delivered");
            return;
        }
        for peer in peers.values() {
            peer.deliver(raw);
        }
    }

    fn send_to(&self, peer: &PeerId, raw: &str) {
        match self.lock().get(peer) {
            Some(peer) => peer.deliver(raw),
            None => warn!("No peer registered with id: {peer}"),
        }
    }
}
