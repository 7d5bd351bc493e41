use crate::error::TransportError;
use crate::signaling::ChannelClosed;
use parking_lot::Mutex;
use periscope_core::SignalingMessage;
use std::collections::VecDeque;

pub type MessageHandler = Box<dyn Fn(SignalingMessage) + Send + Sync>;
pub type CloseHandler = Box<dyn Fn(ChannelClosed) + Send + Sync>;
pub type ErrorHandler = Box<dyn Fn(TransportError) + Send + Sync>;

#[derive(Default)]
struct Slots {
    on_message: Option<MessageHandler>,
    on_close: Option<CloseHandler>,
    on_error: Option<ErrorHandler>,
    backlog: VecDeque<SignalingMessage>,
    pending_close: Option<ChannelClosed>,
    pending_error: Option<TransportError>,
    close_fired: bool,
    error_fired: bool,
}

/// One handler per feed; registering again replaces the previous handler.
///
/// Notifications that arrive before a handler exists are parked and replayed
/// on registration, in order. Handlers run under the slot lock so delivery
/// order matches receipt order; they must not block.
#[derive(Default)]
pub(crate) struct ChannelHandlers {
    slots: Mutex<Slots>,
}

impl ChannelHandlers {
    pub(crate) fn set_message(&self, handler: MessageHandler) {
        let mut guard = self.slots.lock();
        let slots = &mut *guard;
        while let Some(msg) = slots.backlog.pop_front() {
            handler(msg);
        }
        slots.on_message = Some(handler);
    }

    pub(crate) fn set_close(&self, handler: CloseHandler) {
        let mut guard = self.slots.lock();
        let slots = &mut *guard;
        if let Some(closed) = slots.pending_close.take() {
            handler(closed);
        }
        slots.on_close = Some(handler);
    }

    pub(crate) fn set_error(&self, handler: ErrorHandler) {
        let mut guard = self.slots.lock();
        let slots = &mut *guard;
        if let Some(err) = slots.pending_error.take() {
            handler(err);
        }
        slots.on_error = Some(handler);
    }

    pub(crate) fn message(&self, msg: SignalingMessage) {
        let mut guard = self.slots.lock();
        let slots = &mut *guard;
        if slots.close_fired {
            return;
        }
        match &slots.on_message {
            Some(handler) => handler(msg),
            None => slots.backlog.push_back(msg),
        }
    }

    /// Deliver the close notification. Only the first call has any effect.
    pub(crate) fn close(&self, closed: ChannelClosed) {
        let mut guard = self.slots.lock();
        let slots = &mut *guard;
        if slots.close_fired {
            return;
        }
        slots.close_fired = true;
        match &slots.on_close {
            Some(handler) => handler(closed),
            None => slots.pending_close = Some(closed),
        }
    }

    /// Deliver the error notification. Only the first call has any effect.
    pub(crate) fn error(&self, err: TransportError) {
        let mut guard = self.slots.lock();
        let slots = &mut *guard;
        if slots.error_fired || slots.close_fired {
            return;
        }
        slots.error_fired = true;
        match &slots.on_error {
            Some(handler) => handler(err),
            None => slots.pending_error = Some(err),
        }
    }

    pub(crate) fn close_fired(&self) -> bool {
        self.slots.lock().close_fired
    }
}
