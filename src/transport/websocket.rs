//! WebSocket peer links
//!
//! Both accepted and dialed connections run through `run_connection`:
//! - exchange `hello` frames and learn the remote peer id
//! - reject links to ourselves; when two links reach the same peer, keep the
//!   one dialed by the smaller peer id on both ends
//! - register a `Peer` whose channel feeds a dedicated send loop
//! - forward every inbound text frame to the queue actor as a `PeerEvent`
//! - on close, unregister and report the disconnect
//!
//! Outbound links to seed URLs are kept alive by `maintain_seed`, which
//! redials with exponential backoff.

use std::time::Duration;

use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::time::timeout;
use tokio_tungstenite::{WebSocketStream, accept_async, connect_async};
use tracing::{debug, error, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::config::TransportSettings;
use crate::peer::{LocalPeer, Peer, PeerId, PeerSet};
use crate::transport::PeerEvent;
use crate::transport::discovery::should_dial;
use crate::transport::message::HandshakeMessage;
use crate::utils::QueueError;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything a connection task needs: who we are, where to register the
/// peer, and where to report events.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub local: LocalPeer,
    pub peers: PeerSet,
    pub events: UnboundedSender<PeerEvent>,
}

/// Which side opened a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
}

impl Backoff {
    pub fn next(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max)
    }
}

impl From<&TransportSettings> for Backoff {
    fn from(settings: &TransportSettings) -> Self {
        Self {
            initial: Duration::from_millis(settings.backoff_initial_ms),
            max: Duration::from_millis(settings.backoff_max_ms),
        }
    }
}

pub async fn start_peer_listener(listener: TcpListener, endpoint: Endpoint) {
    if let Ok(addr) = listener.local_addr() {
        info!("Peer listener on ws://{addr}");
    }

    while let Ok((stream, remote)) = listener.accept().await {
        let endpoint = endpoint.clone();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    warn!("WebSocket handshake error from {remote}: {e}");
                    return;
                }
            };

            match run_connection(ws_stream, endpoint, Direction::Inbound).await {
                Ok(peer_id) => info!("Inbound peer {peer_id} disconnected"),
                Err(e) => warn!("Inbound connection from {remote} closed: {e}"),
            }
        });
    }

    error!("Peer listener stopped accepting connections");
}

/// One dial attempt. Resolves when the session ends.
pub async fn dial(url: &str, endpoint: Endpoint) -> Result<PeerId, QueueError> {
    let (ws_stream, _response) = connect_async(url).await?;
    run_connection(ws_stream, endpoint, Direction::Outbound).await
}

/// Keep a link to `url` alive for the lifetime of the task.
pub async fn maintain_seed(url: String, endpoint: Endpoint, backoff: Backoff) {
    let mut delay = backoff.initial;

    loop {
        match dial(&url, endpoint.clone()).await {
            Ok(peer_id) => {
                info!("Seed {url} ({peer_id}) disconnected, redialing");
                delay = backoff.initial;
            }
            Err(QueueError::SelfConnection) => {
                warn!("Seed {url} points at this node, not redialing");
                return;
            }
            Err(e) => debug!("Seed {url} unavailable: {e}"),
        }

        tokio::time::sleep(delay).await;
        delay = backoff.next(delay);
    }
}

pub async fn run_connection<S>(
    ws_stream: WebSocketStream<S>,
    endpoint: Endpoint,
    direction: Direction,
) -> Result<PeerId, QueueError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let hello = HandshakeMessage::Hello {
        peer_id: endpoint.local.id,
        name: endpoint.local.name.clone(),
    };
    ws_sender
        .send(WsMessage::text(serde_json::to_string(&hello)?))
        .await?;

    let (peer_id, name) = timeout(HANDSHAKE_TIMEOUT, read_hello(&mut ws_receiver))
        .await
        .map_err(|_| QueueError::Handshake("timed out waiting for hello".to_string()))??;

    if peer_id == endpoint.local.id {
        let _ = ws_sender.close().await;
        return Err(QueueError::SelfConnection);
    }

    // both ends agree on which of two parallel links survives
    let preferred = match direction {
        Direction::Outbound => should_dial(&endpoint.local.id, &peer_id),
        Direction::Inbound => should_dial(&peer_id, &endpoint.local.id),
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();
    let peer = Peer::new(peer_id, name.clone(), tx);
    let link = peer.link;
    if !endpoint.peers.register_link(peer, preferred) {
        let _ = ws_sender.close().await;
        return Err(QueueError::DuplicatePeer(peer_id));
    }

    info!("Connected to peer {peer_id} ({name})");
    let _ = endpoint.events.send(PeerEvent::Connected(peer_id));

    // queue → peer
    let send_loop = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = ws_sender.send(msg).await {
                warn!("Failed to send to peer {peer_id}: {e}");
                break;
            }
        }
        let _ = ws_sender.close().await;
    });

    // peer → queue
    while let Some(frame) = ws_receiver.next().await {
        match frame {
            Ok(WsMessage::Text(text)) => {
                let event = PeerEvent::Message {
                    peer_id,
                    text: text.to_string(),
                };
                if endpoint.events.send(event).is_err() {
                    break;
                }
            }
            Ok(WsMessage::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("Connection to peer {peer_id} failed: {e}");
                break;
            }
        }
    }

    send_loop.abort();
    if endpoint.peers.remove_link(&peer_id, link) {
        let _ = endpoint.events.send(PeerEvent::Disconnected(peer_id));
    } else {
        debug!("Superseded link to peer {peer_id} closed");
    }

    Ok(peer_id)
}

async fn read_hello<S>(
    ws_receiver: &mut SplitStream<WebSocketStream<S>>,
) -> Result<(PeerId, String), QueueError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(frame) = ws_receiver.next().await {
        match frame? {
            WsMessage::Text(text) => {
                let HandshakeMessage::Hello { peer_id, name } =
                    serde_json::from_str::<HandshakeMessage>(text.as_str())
                        .map_err(|e| QueueError::Handshake(format!("bad hello frame: {e}")))?;
                return Ok((peer_id, name));
            }
            WsMessage::Close(_) => break,
            _ => continue,
        }
    }

    Err(QueueError::Handshake(
        "connection closed before hello".to_string(),
    ))
}
