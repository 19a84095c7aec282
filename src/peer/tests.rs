use super::{Peer, PeerSet};
use crate::transport::PeerTransport;
use tokio::sync::mpsc;
use tungstenite::protocol::Message as WsMessage;
use uuid::Uuid;

fn peer(name: &str) -> (Peer, mpsc::UnboundedReceiver<WsMessage>) {
    let (tx, rx) = mpsc::unbounded_channel::<WsMessage>();
    (Peer::new(Uuid::new_v4(), name, tx), rx)
}

#[test]
fn test_register_and_remove_peer() {
    let peers = PeerSet::new();
    let (p, _rx) = peer("bar");
    let id = p.id;

    assert!(peers.register(p));
    assert!(peers.contains(&id));
    assert_eq!(peers.ids(), vec![id]);

    let removed = peers.remove(&id).unwrap();
    assert_eq!(removed.name, "bar");
    assert!(peers.is_empty());
}

#[test]
fn test_register_duplicate_keeps_first() {
    let peers = PeerSet::new();
    let (first, _rx1) = peer("first");
    let id = first.id;
    let (tx, _rx2) = mpsc::unbounded_channel::<WsMessage>();

    assert!(peers.register(first));
    assert!(!peers.register(Peer::new(id, "second", tx)));
    assert_eq!(peers.len(), 1);
    assert_eq!(peers.remove(&id).unwrap().name, "first");
}

#[test]
fn test_clones_share_state() {
    let peers = PeerSet::new();
    let view = peers.clone();
    let (p, _rx) = peer("door");
    let id = p.id;
    peers.register(p);
    assert!(view.contains(&id));
}

#[test]
fn test_broadcast_reaches_every_peer() {
    let peers = PeerSet::new();
    let (a, mut rx_a) = peer("a");
    let (b, mut rx_b) = peer("b");
    peers.register(a);
    peers.register(b);

    peers.broadcast("{\"hello\":1}");

    for rx in [&mut rx_a, &mut rx_b] {
        match rx.try_recv().unwrap() {
            WsMessage::Text(text) => assert_eq!(text.as_str(), "{\"hello\":1}"),
            other => panic!("Expected a text message, got {other:?}"),
        }
    }
}

#[test]
fn test_send_to_targets_one_peer() {
    let peers = PeerSet::new();
    let (a, mut rx_a) = peer("a");
    let (b, mut rx_b) = peer("b");
    let a_id = a.id;
    peers.register(a);
    peers.register(b);

    peers.send_to(&a_id, "only-a");

    assert!(rx_a.try_recv().is_ok());
    assert!(rx_b.try_recv().is_err());
}

#[test]
fn test_broadcast_with_closed_channel_does_not_panic() {
    let peers = PeerSet::new();
    let (p, rx) = peer("gone");
    peers.register(p);
    drop(rx);

    peers.broadcast("payload");
    peers.send_to(&Uuid::new_v4(), "nobody");
}

#[test]
fn test_broadcast_without_peers_is_silent() {
    let peers = PeerSet::new();
    peers.broadcast("payload");
    assert!(peers.is_empty());
}

#[test]
fn test_register_link_can_supersede() {
    let peers = PeerSet::new();
    let (old, mut old_rx) = peer("old");
    let id = old.id;
    let old_link = old.link;
    let (tx, mut new_rx) = mpsc::unbounded_channel::<WsMessage>();
    let new = Peer::new(id, "new", tx);
    let new_link = new.link;
    assert_ne!(old_link, new_link);

    assert!(peers.register(old));
    assert!(peers.register_link(new, true));
    assert_eq!(peers.len(), 1);

    // the superseded link's channel is closed
    assert!(old_rx.try_recv().is_err());
    assert!(old_rx.is_closed());

    peers.send_to(&id, "x");
    assert!(matches!(new_rx.try_recv(), Ok(WsMessage::Text(t)) if t.as_str() == "x"));
}

#[test]
fn test_remove_link_ignores_superseded_link() {
    let peers = PeerSet::new();
    let (old, _old_rx) = peer("old");
    let id = old.id;
    let old_link = old.link;
    let (tx, _new_rx) = mpsc::unbounded_channel::<WsMessage>();
    let new = Peer::new(id, "new", tx);
    let new_link = new.link;

    peers.register(old);
    peers.register_link(new, true);

    assert!(!peers.remove_link(&id, old_link));
    assert!(peers.contains(&id));
    assert!(peers.remove_link(&id, new_link));
    assert!(peers.is_empty());
}
