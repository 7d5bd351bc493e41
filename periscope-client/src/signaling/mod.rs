//! Message socket to the remote peer.

mod channel;
mod handlers;

pub use channel::SignalingChannel;
pub use handlers::{CloseHandler, ErrorHandler, MessageHandler};

/// Why the signaling channel closed, as reported by the close handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelClosed {
    pub code: Option<u16>,
    pub reason: String,
}
