use crate::session::SessionState;
use std::time::Duration;
use thiserror::Error;

/// The signaling endpoint could not be reached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("invalid signaling endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("unsupported signaling transport '{0}' (expected ws or wss)")]
    UnsupportedScheme(String),

    #[error("signaling endpoint refused the connection: {0}")]
    Refused(String),

    #[error("timed out after {0:?} connecting to the signaling endpoint")]
    Timeout(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("signaling channel is closed")]
    Closed,

    #[error("failed to encode signaling frame: {0}")]
    Encode(String),

    #[error("transport rejected the frame: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CloseError {
    #[error("failed to close signaling transport: {0}")]
    Transport(String),
}

/// Malformed or out-of-order handshake data from the peer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("peer sent a second offer")]
    DuplicateOffer,

    #[error("offer could not be applied: {0}")]
    InvalidOffer(String),

    #[error("remote candidate could not be parsed: {0}")]
    InvalidCandidate(String),

    #[error("local answer could not be created: {0}")]
    AnswerFailed(String),
}

/// The signaling transport failed after the session was established.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error(transparent)]
    Send(#[from] SendError),

    #[error("signaling receive failed: {0}")]
    Receive(String),
}

/// The API was called out of sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("call() already placed (session is {0}); create a new session per attempt")]
    AlreadyCalled(SessionState),

    #[error("no active call to hang up (session is {0})")]
    NotActive(SessionState),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("reliable channel is not open")]
pub struct ChannelNotOpenError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The descriptor or candidate text could not be decoded.
    #[error("malformed engine input: {0}")]
    Malformed(String),

    #[error("connectivity engine failure: {0}")]
    Failed(String),

    #[error("connectivity engine is closed")]
    Closed,
}

impl From<webrtc::Error> for EngineError {
    fn from(err: webrtc::Error) -> Self {
        match err {
            webrtc::Error::ErrConnectionClosed => EngineError::Closed,
            other => EngineError::Failed(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error(transparent)]
    ChannelNotOpen(#[from] ChannelNotOpenError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl From<SendError> for SessionError {
    fn from(err: SendError) -> Self {
        SessionError::Transport(TransportError::Send(err))
    }
}
