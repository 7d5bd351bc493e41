use crate::error::{SessionError, TransportError};
use crate::signaling::ChannelClosed;
use periscope_core::SignalingMessage;

/// Everything the driver task reacts to, in arrival order.
#[derive(Debug)]
pub(crate) enum SessionCommand {
    Frame(SignalingMessage),
    ChannelClosed(ChannelClosed),
    ChannelError(TransportError),
    Hangup,
    /// A failure raised off the driver task, e.g. by the candidate pipeline.
    Fault(SessionError),
}
