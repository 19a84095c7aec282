use std::time::Duration;

use tokio::net::UdpSocket;

use crate::config::Settings;
use crate::display::driver::{connect_address, text_address};
use crate::display::{OscArg, OscMessage};
use crate::node::Node;
use crate::queue::{Message, MessageStatus, TEXT_ADDRESS};
use crate::tests::support::{RecordingDisplay, find, wait_for};

fn local_settings(name: &str) -> Settings {
    let mut settings = Settings::default();
    settings.node.name = name.to_string();
    settings.node.host = "127.0.0.1".to_string();
    settings.node.port = 0;
    settings.discovery.enabled = false;
    settings.transport.backoff_initial_ms = 20;
    settings.transport.backoff_max_ms = 100;
    settings
}

async fn node(name: &str) -> (Node, RecordingDisplay) {
    let display = RecordingDisplay::default();
    let node = Node::start_with_display(&local_settings(name), Box::new(display.clone()))
        .await
        .unwrap();
    (node, display)
}

async fn link(a: &Node, b: &mut Node) {
    b.dial(format!("ws://{}", a.listen_addr()));
    tokio::time::timeout(Duration::from_secs(5), async {
        while !(a.peers.contains(&b.local.id) && b.peers.contains(&a.local.id)) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("nodes never linked");
}

fn values(messages: &[Message]) -> Vec<String> {
    let mut values: Vec<_> = messages.iter().map(|m| m.value.clone()).collect();
    values.sort();
    values
}

#[tokio::test]
async fn test_add_and_send_replicate_between_nodes() {
    let (a, a_display) = node("bar").await;
    let (mut b, b_display) = node("door").await;
    link(&a, &mut b).await;

    let added = a.queue.add(TEXT_ADDRESS, "HI", "4").await.unwrap();

    let mut b_view = b.queue.subscribe();
    let seen = wait_for(&mut b_view, |m| find(m, &added.id).is_some()).await;
    let copy = find(&seen, &added.id).unwrap();
    assert_eq!(copy.value, "HI");
    assert_eq!(copy.table_number, "4");
    assert_eq!(copy.timestamp, added.timestamp);
    assert_eq!(copy.status, MessageStatus::Queued);

    a.queue.send(added.id).await.unwrap();
    wait_for(&mut b_view, |m| {
        find(m, &added.id).is_some_and(|m| m.status == MessageStatus::Sent)
    })
    .await;

    // only the node that sent drives the wall
    assert_eq!(a_display.texts(), vec!["HI".to_string()]);
    assert!(b_display.texts().is_empty());
}

#[tokio::test]
async fn test_late_joiners_converge_on_union() {
    let (a, _) = node("bar").await;
    let (mut b, _) = node("door").await;

    a.queue.add(TEXT_ADDRESS, "first", "1").await.unwrap();
    a.queue.add(TEXT_ADDRESS, "second", "2").await.unwrap();
    b.queue.add(TEXT_ADDRESS, "third", "3").await.unwrap();

    link(&a, &mut b).await;

    let expected = vec!["first".to_string(), "second".to_string(), "third".to_string()];
    let mut a_view = a.queue.subscribe();
    let mut b_view = b.queue.subscribe();
    let on_a = wait_for(&mut a_view, |m| m.len() == 3).await;
    let on_b = wait_for(&mut b_view, |m| m.len() == 3).await;
    assert_eq!(values(&on_a), expected);
    assert_eq!(values(&on_b), expected);
}

#[tokio::test]
async fn test_remove_and_clear_replicate() {
    let (a, _) = node("bar").await;
    let (mut b, b_display) = node("door").await;
    link(&a, &mut b).await;

    let keep = a.queue.add(TEXT_ADDRESS, "keep", "1").await.unwrap();
    let gone = a.queue.add(TEXT_ADDRESS, "drop", "2").await.unwrap();

    let mut b_view = b.queue.subscribe();
    wait_for(&mut b_view, |m| m.len() == 2).await;

    b.queue.remove(gone.id).await.unwrap();
    let mut a_view = a.queue.subscribe();
    wait_for(&mut a_view, |m| m.len() == 1).await;

    b.queue.send(keep.id).await.unwrap();
    wait_for(&mut a_view, |m| m[0].status == MessageStatus::Sent).await;

    a.queue.clear_screen().await.unwrap();
    let on_b = wait_for(&mut b_view, |m| {
        m.len() == 1 && m[0].status == MessageStatus::Expired
    })
    .await;
    assert_eq!(on_b[0].id, keep.id);
    assert_eq!(b_display.texts(), vec!["keep".to_string()]);
}

#[tokio::test]
async fn test_started_node_drives_wall_over_osc() {
    let wall = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let mut settings = local_settings("bar");
    settings.display.host = "127.0.0.1".to_string();
    settings.display.port = wall.local_addr().unwrap().port();
    settings.display.layer = 2;
    settings.display.slots = vec![5];

    let node = Node::start(&settings).await.unwrap();
    let message = node.queue.add(TEXT_ADDRESS, "HI", "4").await.unwrap();
    node.queue.send(message.id).await.unwrap();

    let mut buf = [0u8; 1024];
    let mut packets = Vec::new();
    for _ in 0..2 {
        let (len, _) = tokio::time::timeout(Duration::from_secs(2), wall.recv_from(&mut buf))
            .await
            .expect("no OSC packet arrived")
            .unwrap();
        packets.push(buf[..len].to_vec());
    }

    assert_eq!(
        packets,
        vec![
            OscMessage::new(text_address(2, 5))
                .with_arg(OscArg::Str("HI".to_string()))
                .encode(),
            OscMessage::new(connect_address(2, 5))
                .with_arg(OscArg::Int(1))
                .encode(),
        ]
    );
}
