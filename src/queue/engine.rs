//! Queue engine
//!
//! `QueueCore` owns the replicated message list, the expiration timers and
//! the reconciliation rules. It is plain synchronous state: the queue actor
//! calls into it one event at a time, which is what keeps local commands,
//! peer payloads and timer fires from interleaving.
//!
//! Every local mutation is applied first and then broadcast as a full
//! snapshot. Broadcasting is best effort and never rolls the change back.
//! Remote operations are applied but never relayed further.
//!
//! Reconciliation is last-applied-wins: an `update` overwrites the local copy
//! wholesale, whatever order the updates were produced in.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::QueueSettings;
use crate::display::DisplayDriver;
use crate::peer::PeerId;
use crate::queue::message::{Message, MessageStatus};
use crate::queue::operation::{Action, ReplicationOp};
use crate::queue::timer::{ExpirationTimers, TimerAnchor, TimerFired};
use crate::transport::PeerTransport;
use crate::utils::QueueError;

pub struct QueueCore {
    messages: Vec<Message>,
    timers: ExpirationTimers,
    transport: Arc<dyn PeerTransport>,
    display: Box<dyn DisplayDriver>,
    timeout: Duration,
    remote_anchor: TimerAnchor,
    snapshot: watch::Sender<Vec<Message>>,
}

impl QueueCore {
    /// `fired_tx` receives every timer that elapses; the owner must feed
    /// those back into [`QueueCore::handle_timer_fired`].
    pub fn new(
        settings: &QueueSettings,
        transport: Arc<dyn PeerTransport>,
        display: Box<dyn DisplayDriver>,
        fired_tx: UnboundedSender<TimerFired>,
    ) -> Self {
        let (snapshot, _) = watch::channel(Vec::new());
        Self {
            messages: Vec::new(),
            timers: ExpirationTimers::new(fired_tx),
            transport,
            display,
            timeout: settings.timeout(),
            remote_anchor: settings.remote_timer_anchor,
            snapshot,
        }
    }

    /// Messages in insertion order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, id: &Uuid) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == *id)
    }

    pub fn timer_armed(&self, id: &Uuid) -> bool {
        self.timers.is_armed(id)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Push-based view of the message list, refreshed after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Message>> {
        self.snapshot.subscribe()
    }

    fn position(&self, id: &Uuid) -> Option<usize> {
        self.messages.iter().position(|m| m.id == *id)
    }

    fn publish(&self) {
        self.snapshot.send_replace(self.messages.clone());
    }

    fn broadcast(&self, op: ReplicationOp) {
        match op.encode() {
            Ok(raw) => self.transport.broadcast(&raw),
            Err(e) => error!("Failed to serialize {:?} for {}: {e}", op.action, op.message.id),
        }
    }

    pub fn add(
        &mut self,
        address: &str,
        value: &str,
        table_number: &str,
        broadcast: bool,
    ) -> Result<Message, QueueError> {
        let message = Message::create(address, value, table_number)
            .inspect_err(|e| warn!("Rejected new message: {e}"))?;

        self.timers.arm(message.id, self.timeout);
        self.messages.push(message.clone());
        info!("Queued {} for table {}", message.id, message.table_number);

        if broadcast {
            self.broadcast(ReplicationOp::add(message.clone()));
        }
        self.publish();
        Ok(message)
    }

    /// Put a message on the wall. The expiration timer keeps running from
    /// the message's creation.
    pub fn send(&mut self, id: &Uuid) -> Option<Message> {
        let Some(index) = self.position(id) else {
            warn!("send: message {id} not found");
            return None;
        };

        self.messages[index].status = MessageStatus::Sent;
        let message = self.messages[index].clone();

        let slot = self.display.send_text(&message.value);
        info!("Sent {} to slot {slot}", message.id);

        self.broadcast(ReplicationOp::update(message.clone()));
        self.publish();
        Some(message)
    }

    pub fn remove(&mut self, id: &Uuid) -> Option<Message> {
        let Some(index) = self.position(id) else {
            debug!("remove: message {id} not found");
            return None;
        };

        self.timers.cancel(id);
        let message = self.messages.remove(index);
        info!("Removed {}", message.id);

        self.broadcast(ReplicationOp::remove(message.clone()));
        self.publish();
        Some(message)
    }

    /// Take a sent message off the wall and back to `queued`. Its timer is
    /// canceled and not re-armed. Anything not currently sent is left alone.
    pub fn cancel_message(&mut self, id: &Uuid) -> Option<Message> {
        let Some(index) = self.position(id) else {
            debug!("cancel: message {id} not found");
            return None;
        };
        if !self.messages[index].is_sent() {
            debug!(
                "cancel: message {id} is {}, nothing to cancel",
                self.messages[index].status
            );
            return None;
        }

        self.display.clear();
        self.messages[index].status = MessageStatus::Queued;
        self.timers.cancel(id);
        let message = self.messages[index].clone();
        info!("Canceled {}", message.id);

        self.broadcast(ReplicationOp::update(message.clone()));
        self.publish();
        Some(message)
    }

    /// Blank the wall and expire every sent message, one broadcast each.
    pub fn clear_screen(&mut self) -> Vec<Message> {
        self.display.clear();

        let mut expired = Vec::new();
        for message in self.messages.iter_mut().filter(|m| m.is_sent()) {
            message.status = MessageStatus::Expired;
            expired.push(message.clone());
        }

        for message in &expired {
            self.broadcast(ReplicationOp::update(message.clone()));
        }
        info!("Cleared screen, {} message(s) expired", expired.len());
        self.publish();
        expired
    }

    /// Expire a message whose timer elapsed. Fires for timers canceled in
    /// the meantime are ignored.
    pub fn handle_timer_fired(&mut self, fired: TimerFired) -> Option<Message> {
        let id = fired.id;
        if !self.timers.take_fired(&fired) {
            debug!("Ignoring stale timer for {id}");
            return None;
        }
        let index = self.position(&id)?;

        if self.messages[index].is_sent() {
            self.display.clear();
        }
        self.messages[index].status = MessageStatus::Expired;
        let message = self.messages[index].clone();
        info!("Expired {}", message.id);

        self.broadcast(ReplicationOp::update(message.clone()));
        self.publish();
        Some(message)
    }

    /// Decode and apply a payload from a peer. Malformed payloads are
    /// dropped whole.
    pub fn apply_remote(&mut self, peer_id: &PeerId, raw: &str) -> bool {
        match ReplicationOp::decode(raw) {
            Ok(op) => self.apply(op),
            Err(e) => {
                warn!("Dropping malformed payload from {peer_id}: {e}");
                false
            }
        }
    }

    /// Apply a remote operation. Returns whether local state changed.
    pub fn apply(&mut self, op: ReplicationOp) -> bool {
        let ReplicationOp { action, message } = op;
        let id = message.id;

        match action {
            Action::Add => {
                if self.position(&id).is_some() {
                    debug!("Ignoring add for known message {id}");
                    return false;
                }
                let after = self.remote_timer_duration(&message);
                self.timers.arm(id, after);
                self.messages.push(message);
                debug!("Replicated add {id}, expires in {after:?}");
            }
            Action::Update => {
                let Some(index) = self.position(&id) else {
                    debug!("Dropping update for unknown message {id}");
                    return false;
                };
                self.messages[index] = message;
                debug!("Replicated update {id}");
            }
            Action::Remove => {
                let Some(index) = self.position(&id) else {
                    debug!("Ignoring remove for unknown message {id}");
                    return false;
                };
                self.timers.cancel(&id);
                self.messages.remove(index);
                debug!("Replicated remove {id}");
            }
        }

        self.publish();
        true
    }

    fn remote_timer_duration(&self, message: &Message) -> Duration {
        match self.remote_anchor {
            TimerAnchor::Timestamp => message.remaining(self.timeout, Utc::now()),
            TimerAnchor::Receipt => self.timeout,
        }
    }

    /// Bring a newly connected peer up to date: one directed `add` per
    /// local message. Known ids are ignored on the far side.
    pub fn sync_peer(&self, peer_id: &PeerId) {
        for message in &self.messages {
            match ReplicationOp::add(message.clone()).encode() {
                Ok(raw) => self.transport.send_to(peer_id, &raw),
                Err(e) => error!("Failed to serialize {} for sync: {e}", message.id),
            }
        }
        debug!("Synced {} message(s) to {peer_id}", self.messages.len());
    }
}
