//! Per-message expiration timers
//!
//! Each armed timer is a detached tokio task that sleeps and then posts the
//! message id into the queue actor's timer channel. The task never touches
//! queue state itself; the actor decides what a fire means.
//!
//! A timer that elapses after it was canceled may still have its fire sitting
//! in the channel, possibly after a new timer was armed for the same id.
//! Every arm gets a fresh generation and `take_fired` only accepts a fire
//! whose generation is still the armed one.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::AbortHandle;
use uuid::Uuid;

/// Where a timer for a message received from a peer starts counting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerAnchor {
    /// Count from the message's own creation timestamp, so every peer's copy
    /// expires at the same wall-clock time.
    #[default]
    Timestamp,
    /// Run the full timeout from the moment the add arrived.
    Receipt,
}

/// Posted by a timer task when its sleep elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    pub id: Uuid,
    generation: u64,
}

#[derive(Debug)]
pub struct ExpirationTimers {
    armed: HashMap<Uuid, (u64, AbortHandle)>,
    next_generation: u64,
    fired_tx: UnboundedSender<TimerFired>,
}

impl ExpirationTimers {
    pub fn new(fired_tx: UnboundedSender<TimerFired>) -> Self {
        Self {
            armed: HashMap::new(),
            next_generation: 0,
            fired_tx,
        }
    }

    /// Arm a timer for `id` unless one already exists. Returns whether a
    /// new timer was started.
    pub fn arm(&mut self, id: Uuid, after: Duration) -> bool {
        if self.armed.contains_key(&id) {
            return false;
        }

        let generation = self.next_generation;
        self.next_generation += 1;

        let fired_tx = self.fired_tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            // receiver gone means the actor shut down
            let _ = fired_tx.send(TimerFired { id, generation });
        });
        self.armed.insert(id, (generation, task.abort_handle()));
        true
    }

    pub fn cancel(&mut self, id: &Uuid) -> bool {
        match self.armed.remove(id) {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Consume the entry for a timer that just fired. `false` means that
    /// timer had been canceled in the meantime, even if another one has
    /// been armed for the same id since.
    pub fn take_fired(&mut self, fired: &TimerFired) -> bool {
        match self.armed.get(&fired.id) {
            Some((generation, _)) if *generation == fired.generation => {
                self.armed.remove(&fired.id);
                true
            }
            _ => false,
        }
    }

    pub fn is_armed(&self, id: &Uuid) -> bool {
        self.armed.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.armed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }
}

impl Drop for ExpirationTimers {
    fn drop(&mut self) {
        for (_, handle) in self.armed.values() {
            handle.abort();
        }
    }
}
