//! UDP broadcast discovery
//!
//! Every node periodically broadcasts a `Beacon` with its peer id and
//! WebSocket port, and listens on the same port for everyone else's. Only
//! the side with the smaller id dials, so a pair of nodes that hear each
//! other open a single link between them.
//!
//! Dialed links are one-shot: when one drops, the next beacon from that
//! peer triggers a fresh dial.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::config::DiscoverySettings;
use crate::peer::PeerId;
use crate::transport::message::Beacon;
use crate::transport::websocket::{Endpoint, dial};
use crate::utils::QueueError;

pub fn should_dial(local: &PeerId, remote: &PeerId) -> bool {
    remote > local
}

/// WebSocket URL for the node that sent a beacon from `from`.
pub fn beacon_url(from: SocketAddr, port: u16) -> String {
    format!("ws://{}", SocketAddr::new(from.ip(), port))
}

pub async fn run_discovery(
    settings: DiscoverySettings,
    listen_port: u16,
    endpoint: Endpoint,
) -> Result<(), QueueError> {
    let socket = UdpSocket::bind(("0.0.0.0", settings.port)).await?;
    socket.set_broadcast(true)?;

    let beacon = serde_json::to_vec(&Beacon {
        peer_id: endpoint.local.id,
        port: listen_port,
    })?;
    let broadcast_addr = SocketAddr::from(([255, 255, 255, 255], settings.port));
    let in_flight: Arc<Mutex<HashSet<PeerId>>> = Arc::default();

    let mut ticker = interval(Duration::from_secs(settings.interval_secs.max(1)));
    let mut buf = [0u8; 512];

    info!("Discovery beacons on udp/{}", settings.port);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = socket.send_to(&beacon, broadcast_addr).await {
                    warn!("Failed to send discovery beacon: {e}");
                }
            }
            received = socket.recv_from(&mut buf) => match received {
                Ok((len, from)) => handle_beacon(&buf[..len], from, &endpoint, &in_flight),
                Err(e) => warn!("Discovery receive failed: {e}"),
            },
        }
    }
}

fn handle_beacon(
    payload: &[u8],
    from: SocketAddr,
    endpoint: &Endpoint,
    in_flight: &Arc<Mutex<HashSet<PeerId>>>,
) {
    let beacon: Beacon = match serde_json::from_slice(payload) {
        Ok(beacon) => beacon,
        Err(e) => {
            debug!("Ignoring malformed beacon from {from}: {e}");
            return;
        }
    };

    let peer_id = beacon.peer_id;
    if !should_dial(&endpoint.local.id, &peer_id) || endpoint.peers.contains(&peer_id) {
        return;
    }
    if !in_flight
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(peer_id)
    {
        return;
    }

    let url = beacon_url(from, beacon.port);
    info!("Discovered peer {peer_id} at {url}");

    let endpoint = endpoint.clone();
    let in_flight = in_flight.clone();
    tokio::spawn(async move {
        match dial(&url, endpoint).await {
            Ok(_) => info!("Discovered peer {peer_id} disconnected"),
            Err(e) => warn!("Dial to discovered peer {peer_id} failed: {e}"),
        }
        in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&peer_id);
    });
}
