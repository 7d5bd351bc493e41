use std::fmt;

/// Where a session is in the handshake.
///
/// ```text
/// Idle -> Dialing -> AwaitingOffer -> Answering -> Connected -> Closing -> Closed
///                 \___________________________________________________/
///                                   any of these -> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    Dialing,
    AwaitingOffer,
    Answering,
    Connected,
    Closing,
    Closed,
    Failed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Failed)
    }

    /// A call has been placed and teardown has not started.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            SessionState::Dialing
                | SessionState::AwaitingOffer
                | SessionState::Answering
                | SessionState::Connected
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Dialing => "dialing",
            SessionState::AwaitingOffer => "awaiting-offer",
            SessionState::Answering => "answering",
            SessionState::Connected => "connected",
            SessionState::Closing => "closing",
            SessionState::Closed => "closed",
            SessionState::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
