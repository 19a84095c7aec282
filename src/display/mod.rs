//! The `display` module drives the video wall.
//!
//! The queue engine only knows the `DisplayDriver` trait. The default
//! implementation, `OscDisplay`, speaks OSC over UDP to a Resolume-style
//! composition: text goes into a block-text clip chosen from a fixed
//! rotation, and a dedicated empty clip is triggered to clear the layer.

pub mod driver;
pub mod osc;

pub use driver::{OscDisplay, SlotRotation};
pub use osc::{OscArg, OscMessage};

/// Output side of the queue. Both calls are fire-and-forget: failures are
/// logged by the implementation and never reported back.
pub trait DisplayDriver: Send {
    /// Show `text` in the next slot of the rotation and return that slot.
    fn send_text(&mut self, text: &str) -> u32;

    /// Trigger the clear slot.
    fn clear(&mut self);
}
