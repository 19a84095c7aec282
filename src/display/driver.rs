//! OSC display driver
//!
//! Slot selection is a plain round-robin cursor local to this process. It is
//! never replicated: only the peer that issues `send` drives the wall, and
//! each peer keeps its own position in the rotation.

use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tracing::{debug, warn};

use crate::config::DisplaySettings;
use crate::display::DisplayDriver;
use crate::display::osc::{OscArg, OscMessage};
use crate::utils::QueueError;

pub fn text_address(layer: u32, clip: u32) -> String {
    format!(
        "/composition/layers/{layer}/clips/{clip}/video/source/blocktextgenerator/text/params/lines"
    )
}

pub fn connect_address(layer: u32, clip: u32) -> String {
    format!("/composition/layers/{layer}/clips/{clip}/connect")
}

/// Round-robin over a fixed, non-empty list of clip numbers.
#[derive(Debug, Clone)]
pub struct SlotRotation {
    slots: Vec<u32>,
    cursor: usize,
}

impl SlotRotation {
    pub fn new(slots: Vec<u32>) -> Result<Self, QueueError> {
        if slots.is_empty() {
            return Err(QueueError::InvalidSetting(
                "display.slots must list at least one clip".to_string(),
            ));
        }
        Ok(Self { slots, cursor: 0 })
    }

    /// Current slot, then advance (wrapping). Never checks whether the slot
    /// is still showing something.
    pub fn next_slot(&mut self) -> u32 {
        let slot = self.slots[self.cursor];
        self.cursor = (self.cursor + 1) % self.slots.len();
        slot
    }

    pub fn peek(&self) -> u32 {
        self.slots[self.cursor]
    }
}

#[derive(Debug)]
pub struct OscDisplay {
    socket: UdpSocket,
    target: SocketAddr,
    layer: u32,
    rotation: SlotRotation,
    clear_slot: u32,
    uppercase: bool,
}

impl OscDisplay {
    /// Bind an ephemeral UDP socket and resolve the wall's OSC input.
    pub async fn connect(settings: &DisplaySettings) -> Result<Self, QueueError> {
        let target = tokio::net::lookup_host((settings.host.as_str(), settings.port))
            .await?
            .next()
            .ok_or_else(|| {
                QueueError::InvalidSetting(format!("cannot resolve display host {}", settings.host))
            })?;

        let bind_addr: SocketAddr = if target.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let socket = UdpSocket::bind(bind_addr).await?;

        Ok(Self {
            socket,
            target,
            layer: settings.layer,
            rotation: SlotRotation::new(settings.slots.clone())?,
            clear_slot: settings.clear_slot,
            uppercase: settings.uppercase,
        })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    fn emit(&self, message: OscMessage) {
        let packet = message.encode();
        match self.socket.try_send_to(&packet, self.target) {
            Ok(_) => debug!("OSC {} -> {}", message.address, self.target),
            Err(e) => warn!("Failed to send OSC {} to {}: {e}", message.address, self.target),
        }
    }

    fn trigger(&self, clip: u32) {
        self.emit(OscMessage::new(connect_address(self.layer, clip)).with_arg(OscArg::Int(1)));
    }
}

impl DisplayDriver for OscDisplay {
    fn send_text(&mut self, text: &str) -> u32 {
        let clip = self.rotation.next_slot();
        let text = if self.uppercase {
            text.to_uppercase()
        } else {
            text.to_string()
        };

        self.emit(OscMessage::new(text_address(self.layer, clip)).with_arg(OscArg::Str(text)));
        self.trigger(clip);
        clip
    }

    fn clear(&mut self) {
        self.trigger(self.clear_slot);
    }
}
