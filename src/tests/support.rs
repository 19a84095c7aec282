//! Recording fakes for the queue's collaborators.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use uuid::Uuid;

use crate::display::DisplayDriver;
use crate::peer::PeerId;
use crate::queue::{Message, ReplicationOp};
use crate::transport::PeerTransport;

#[derive(Debug, Clone)]
pub struct Delivery {
    pub to: Option<PeerId>,
    pub op: ReplicationOp,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    log: Arc<Mutex<Vec<Delivery>>>,
}

impl RecordingTransport {
    pub fn broadcasts(&self) -> Vec<ReplicationOp> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.to.is_none())
            .map(|d| d.op.clone())
            .collect()
    }

    pub fn sent_to(&self, peer: &PeerId) -> Vec<ReplicationOp> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.to.as_ref() == Some(peer))
            .map(|d| d.op.clone())
            .collect()
    }

    pub fn reset(&self) {
        self.log.lock().unwrap().clear();
    }

    fn record(&self, to: Option<PeerId>, raw: &str) {
        let op = ReplicationOp::decode(raw).expect("engine produced an undecodable payload");
        self.log.lock().unwrap().push(Delivery { to, op });
    }
}

impl PeerTransport for RecordingTransport {
    fn broadcast(&self, raw: &str) {
        self.record(None, raw);
    }

    fn send_to(&self, peer: &PeerId, raw: &str) {
        self.record(Some(*peer), raw);
    }
}

#[derive(Debug, Default)]
pub struct DisplayLog {
    pub texts: Vec<String>,
    pub clears: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingDisplay {
    log: Arc<Mutex<DisplayLog>>,
}

impl RecordingDisplay {
    pub fn texts(&self) -> Vec<String> {
        self.log.lock().unwrap().texts.clone()
    }

    pub fn clears(&self) -> usize {
        self.log.lock().unwrap().clears
    }
}

impl DisplayDriver for RecordingDisplay {
    fn send_text(&mut self, text: &str) -> u32 {
        let mut log = self.log.lock().unwrap();
        log.texts.push(text.to_string());
        log.texts.len() as u32
    }

    fn clear(&mut self) {
        self.log.lock().unwrap().clears += 1;
    }
}

/// Wait (up to five seconds) until the published list satisfies `pred`.
pub async fn wait_for(
    rx: &mut watch::Receiver<Vec<Message>>,
    pred: impl Fn(&[Message]) -> bool,
) -> Vec<Message> {
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        loop {
            {
                let current = rx.borrow_and_update();
                if pred(&current) {
                    return current.clone();
                }
            }
            rx.changed().await.expect("queue actor stopped");
        }
    })
    .await
    .expect("timed out waiting for queue state")
}

pub fn find<'a>(messages: &'a [Message], id: &Uuid) -> Option<&'a Message> {
    messages.iter().find(|m| m.id == *id)
}
