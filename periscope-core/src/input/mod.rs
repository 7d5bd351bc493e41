//! Encoders that turn local input state into opaque payloads for the
//! reliable channel. They know nothing about sessions; callers feed events
//! in and forward whatever bytes come out.

mod gamepad;
mod keyboard;

use bytes::Bytes;

pub use gamepad::{ButtonState, GamepadEncoder, GamepadSnapshot, ANALOG_THRESHOLD};
pub use keyboard::{scancode, KeyEvent, KeyboardEncoder};

pub trait InputEncoder {
    type Event;

    /// Encode one raw event. `None` means there is nothing to send.
    fn encode(&mut self, event: &Self::Event) -> Option<Bytes>;
}
