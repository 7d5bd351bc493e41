use crate::engine::{ReliableChannel, RemoteStream};
use crate::error::SessionError;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub type RemoteStreamHandler = Box<dyn Fn(RemoteStream) + Send + Sync>;
pub type ReliableChannelHandler = Box<dyn Fn(Arc<dyn ReliableChannel>) + Send + Sync>;
pub type PeerMessageHandler = Box<dyn Fn(String) + Send + Sync>;
pub type SessionCloseHandler = Box<dyn Fn(CloseEvent) + Send + Sync>;

/// Delivered once when a session ends, gracefully or not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseEvent {
    /// Set when the session ended because something went wrong.
    pub error: Option<SessionError>,
    /// WebSocket close code, when the peer sent one.
    pub code: Option<u16>,
    pub reason: String,
}

impl CloseEvent {
    pub fn is_graceful(&self) -> bool {
        self.error.is_none()
    }
}

/// Single-handler slots for the outward session events.
///
/// Handlers run on the session's driver task and must not register
/// observers on the same session from inside the callback.
#[derive(Default)]
pub(crate) struct Observers {
    remote_stream: Mutex<Option<RemoteStreamHandler>>,
    reliable_channel: Mutex<Option<ReliableChannelHandler>>,
    message: Mutex<Option<PeerMessageHandler>>,
    close: Mutex<Option<SessionCloseHandler>>,
    close_fired: AtomicBool,
}

impl Observers {
    pub(crate) fn set_remote_stream(&self, handler: RemoteStreamHandler) {
        *self.remote_stream.lock() = Some(handler);
    }

    pub(crate) fn set_reliable_channel(&self, handler: ReliableChannelHandler) {
        *self.reliable_channel.lock() = Some(handler);
    }

    pub(crate) fn set_message(&self, handler: PeerMessageHandler) {
        *self.message.lock() = Some(handler);
    }

    pub(crate) fn set_close(&self, handler: SessionCloseHandler) {
        *self.close.lock() = Some(handler);
    }

    pub(crate) fn remote_stream(&self, stream: RemoteStream) {
        if let Some(handler) = self.remote_stream.lock().as_ref() {
            handler(stream);
        }
    }

    pub(crate) fn reliable_channel(&self, channel: Arc<dyn ReliableChannel>) {
        if let Some(handler) = self.reliable_channel.lock().as_ref() {
            handler(channel);
        }
    }

    pub(crate) fn message(&self, data: String) {
        if let Some(handler) = self.message.lock().as_ref() {
            handler(data);
        }
    }

    /// Fire the close observer. Returns `false` if it already fired.
    pub(crate) fn close(&self, event: CloseEvent) -> bool {
        if self.close_fired.swap(true, Ordering::SeqCst) {
            return false;
        }
        if let Some(handler) = self.close.lock().as_ref() {
            handler(event);
        }
        true
    }
}
