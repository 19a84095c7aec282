//! Message definitions for the replicated queue
//!
//! `Message` is both the in-memory record and the snapshot carried inside
//! every replication operation. Field names on the wire are camelCase
//! (`tableNumber`) and the timestamp is RFC 3339.
//!
//! Only `status` changes after creation, and only the queue engine changes it.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::QueueError;

/// Every display address starts with this marker.
pub const ADDRESS_PREFIX: char = '/';

/// The only address the console currently produces.
pub const TEXT_ADDRESS: &str = "/text";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Queued,
    Sent,
    Expired,
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageStatus::Queued => "queued",
            MessageStatus::Sent => "sent",
            MessageStatus::Expired => "expired",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub address: String,
    pub value: String,
    pub table_number: String,
    pub timestamp: DateTime<Utc>,
    pub status: MessageStatus,
}

impl Message {
    /// Build a fresh queued message with a new id, stamped now.
    ///
    /// Fails when `address` lacks the leading [`ADDRESS_PREFIX`]. `value` and
    /// `table_number` are not checked here.
    pub fn create(address: &str, value: &str, table_number: &str) -> Result<Self, QueueError> {
        if !address.starts_with(ADDRESS_PREFIX) {
            return Err(QueueError::InvalidAddress(address.to_string()));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            address: address.to_string(),
            value: value.to_string(),
            table_number: table_number.to_string(),
            timestamp: Utc::now(),
            status: MessageStatus::Queued,
        })
    }

    pub fn is_sent(&self) -> bool {
        self.status == MessageStatus::Sent
    }

    /// Time left until `timestamp + timeout`, saturating at zero.
    ///
    /// A timestamp in the future (clock skew between peers) counts as no
    /// time elapsed.
    pub fn remaining(&self, timeout: Duration, now: DateTime<Utc>) -> Duration {
        let elapsed = (now - self.timestamp).to_std().unwrap_or(Duration::ZERO);
        timeout.saturating_sub(elapsed)
    }
}
