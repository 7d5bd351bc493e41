mod candidates;
mod command;
mod driver;
mod observers;
mod session;
mod state;

pub use observers::{
    CloseEvent, PeerMessageHandler, ReliableChannelHandler, RemoteStreamHandler,
    SessionCloseHandler,
};
pub use session::Session;
pub use state::SessionState;

use crate::engine::ReliableChannel;
use observers::Observers;
use parking_lot::Mutex;
use periscope_core::SessionId;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// State visible to both the caller-facing handle and the driver task.
pub(crate) struct Shared {
    pub(crate) id: SessionId,
    pub(crate) state: watch::Sender<SessionState>,
    pub(crate) observers: Observers,
    /// Set while the peer's data channel is open; cleared on teardown.
    pub(crate) reliable: Mutex<Option<Arc<dyn ReliableChannel>>>,
}

impl Shared {
    pub(crate) fn new(id: SessionId) -> Self {
        let (state, _rx) = watch::channel(SessionState::Idle);
        Self {
            id,
            state,
            observers: Observers::default(),
            reliable: Mutex::new(None),
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub(crate) fn set_state(&self, next: SessionState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            info!(session = %self.id, "Session state {} -> {}", prev, next);
        }
    }

    /// Move `from -> to` only if the session is still in `from`.
    pub(crate) fn transition(&self, from: SessionState, to: SessionState) -> bool {
        let moved = self.state.send_if_modified(|state| {
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        });
        if moved {
            info!(session = %self.id, "Session state {} -> {}", from, to);
        }
        moved
    }
}
