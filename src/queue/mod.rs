//! The replicated message queue.
//!
//! - `message`: the replicated record and its validation
//! - `operation`: add/update/remove wire operations
//! - `timer`: per-message expiration timers
//! - `engine`: local command handlers and remote reconciliation
//! - `actor`: the task that serializes all access to the engine

pub mod actor;
pub mod engine;
pub mod message;
pub mod operation;
pub mod timer;

pub use actor::{QueueHandle, spawn_queue};
pub use engine::QueueCore;
pub use message::{Message, MessageStatus, TEXT_ADDRESS};
pub use operation::{Action, ReplicationOp};
pub use timer::{TimerAnchor, TimerFired};
