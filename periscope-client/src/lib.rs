//! Native client for viewing a remote WebRTC peer.
//!
//! A [`Session`] opens a [`SignalingChannel`] to the peer, asks it to call,
//! answers its offer through a [`ConnectivityEngine`] and trickles candidates
//! both ways until the media stream and the reliable input channel are up.

pub mod config;
pub mod engine;
pub mod error;
pub mod gate;
pub mod session;
pub mod signaling;

pub use config::SessionConfig;
pub use engine::{
    ConnectivityEngine, EngineEvent, EngineEventSender, EngineFactory, ReliableChannel,
    RemoteStream, WebrtcEngine, WebrtcEngineFactory,
};
pub use error::{
    ChannelNotOpenError, CloseError, ConnectError, EngineError, ProtocolError, SendError,
    SessionError, TransportError, UsageError,
};
pub use gate::RemoteDescriptionGate;
pub use session::{CloseEvent, Session, SessionState};
pub use signaling::{ChannelClosed, SignalingChannel};
