//! Queue actor
//!
//! The single task that owns a `QueueCore`. Three inputs are serialized
//! through one `select!` loop:
//! - commands from `QueueHandle`s (console, tests), each with a reply channel
//! - `PeerEvent`s from connection tasks
//! - elapsed expiration timers
//!
//! Nothing else touches queue state. The actor stops once every
//! `QueueHandle` has been dropped.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::QueueSettings;
use crate::display::DisplayDriver;
use crate::queue::engine::QueueCore;
use crate::queue::message::Message;
use crate::queue::timer::TimerFired;
use crate::transport::{PeerEvent, PeerTransport};
use crate::utils::QueueError;

#[derive(Debug)]
pub enum QueueCommand {
    Add {
        address: String,
        value: String,
        table_number: String,
        reply: oneshot::Sender<Result<Message, QueueError>>,
    },
    Send {
        id: Uuid,
        reply: oneshot::Sender<Option<Message>>,
    },
    Cancel {
        id: Uuid,
        reply: oneshot::Sender<Option<Message>>,
    },
    Remove {
        id: Uuid,
        reply: oneshot::Sender<Option<Message>>,
    },
    ClearScreen {
        reply: oneshot::Sender<Vec<Message>>,
    },
}

/// Cloneable front end to the queue actor.
#[derive(Debug, Clone)]
pub struct QueueHandle {
    commands: UnboundedSender<QueueCommand>,
    snapshot: watch::Receiver<Vec<Message>>,
}

impl QueueHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> QueueCommand,
    ) -> Result<T, QueueError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .map_err(|_| QueueError::ActorClosed)?;
        response.await.map_err(|_| QueueError::ActorClosed)
    }

    pub async fn add(
        &self,
        address: impl Into<String>,
        value: impl Into<String>,
        table_number: impl Into<String>,
    ) -> Result<Message, QueueError> {
        let (address, value, table_number) = (address.into(), value.into(), table_number.into());
        self.request(|reply| QueueCommand::Add {
            address,
            value,
            table_number,
            reply,
        })
        .await?
    }

    pub async fn send(&self, id: Uuid) -> Result<Option<Message>, QueueError> {
        self.request(|reply| QueueCommand::Send { id, reply }).await
    }

    pub async fn cancel(&self, id: Uuid) -> Result<Option<Message>, QueueError> {
        self.request(|reply| QueueCommand::Cancel { id, reply }).await
    }

    pub async fn remove(&self, id: Uuid) -> Result<Option<Message>, QueueError> {
        self.request(|reply| QueueCommand::Remove { id, reply }).await
    }

    pub async fn clear_screen(&self) -> Result<Vec<Message>, QueueError> {
        self.request(|reply| QueueCommand::ClearScreen { reply })
            .await
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Message>> {
        self.snapshot.clone()
    }

    /// Latest published message list.
    pub fn snapshot(&self) -> Vec<Message> {
        self.snapshot.borrow().clone()
    }
}

pub struct QueueActor {
    core: QueueCore,
    commands: UnboundedReceiver<QueueCommand>,
    peer_events: UnboundedReceiver<PeerEvent>,
    timer_fires: UnboundedReceiver<TimerFired>,
}

impl QueueActor {
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(event) = self.peer_events.recv() => self.handle_peer_event(event),
                Some(fired) = self.timer_fires.recv() => {
                    self.core.handle_timer_fired(fired);
                }
            }
        }
        info!("Queue actor stopped");
    }

    fn handle_command(&mut self, command: QueueCommand) {
        // a dropped reply receiver only means the caller stopped waiting
        match command {
            QueueCommand::Add {
                address,
                value,
                table_number,
                reply,
            } => {
                let _ = reply.send(self.core.add(&address, &value, &table_number, true));
            }
            QueueCommand::Send { id, reply } => {
                let _ = reply.send(self.core.send(&id));
            }
            QueueCommand::Cancel { id, reply } => {
                let _ = reply.send(self.core.cancel_message(&id));
            }
            QueueCommand::Remove { id, reply } => {
                let _ = reply.send(self.core.remove(&id));
            }
            QueueCommand::ClearScreen { reply } => {
                let _ = reply.send(self.core.clear_screen());
            }
        }
    }

    fn handle_peer_event(&mut self, event: PeerEvent) {
        match event {
            PeerEvent::Connected(peer_id) => {
                info!("Peer {peer_id} joined, sending current queue");
                self.core.sync_peer(&peer_id);
            }
            PeerEvent::Disconnected(peer_id) => info!("Peer {peer_id} left"),
            PeerEvent::Message { peer_id, text } => {
                debug!("Payload from {peer_id}");
                self.core.apply_remote(&peer_id, &text);
            }
        }
    }
}

/// Build a queue core and spawn its actor on the current runtime.
pub fn spawn_queue(
    settings: &QueueSettings,
    transport: Arc<dyn PeerTransport>,
    display: Box<dyn DisplayDriver>,
    peer_events: UnboundedReceiver<PeerEvent>,
) -> (QueueHandle, JoinHandle<()>) {
    let (fired_tx, timer_fires) = mpsc::unbounded_channel();
    let (commands_tx, commands) = mpsc::unbounded_channel();

    let core = QueueCore::new(settings, transport, display, fired_tx);
    let handle = QueueHandle {
        commands: commands_tx,
        snapshot: core.subscribe(),
    };

    let actor = QueueActor {
        core,
        commands,
        peer_events,
        timer_fires,
    };
    (handle, tokio::spawn(actor.run()))
}
