//! Seam between the session state machine and the peer-connection engine.
//!
//! The session never looks inside descriptors or candidates; it hands the
//! opaque strings from the wire to a [`ConnectivityEngine`] and forwards
//! whatever the engine reports through [`EngineEvent`]s.

mod rtc;

pub use rtc::{DataChannelHandle, WebrtcEngine, WebrtcEngineFactory};

use crate::error::EngineError;
use async_trait::async_trait;
use bytes::Bytes;
use periscope_core::IceServerConfig;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use webrtc::track::track_remote::TrackRemote;

pub type EngineEventSender = mpsc::UnboundedSender<EngineEvent>;

#[async_trait]
pub trait ConnectivityEngine: Send + Sync {
    /// Apply the peer's offer as the remote description.
    async fn set_remote_offer(&self, descriptor: &str) -> Result<(), EngineError>;

    /// Create the local answer, commit it as the local description and return it.
    async fn create_answer(&self) -> Result<String, EngineError>;

    async fn add_remote_candidate(&self, candidate: &str) -> Result<(), EngineError>;

    async fn close(&self) -> Result<(), EngineError>;
}

#[async_trait]
pub trait EngineFactory: Send + Sync {
    async fn create(
        &self,
        ice_servers: &[IceServerConfig],
        events: EngineEventSender,
    ) -> Result<Arc<dyn ConnectivityEngine>, EngineError>;
}

/// Ordered, reliable side channel negotiated by the peer.
#[async_trait]
pub trait ReliableChannel: Send + Sync {
    fn label(&self) -> String;

    async fn send(&self, payload: Bytes) -> Result<(), EngineError>;
}

pub enum EngineEvent {
    /// A local candidate to trickle to the peer; `None` once gathering is complete.
    LocalCandidate(Option<String>),
    RemoteStream(RemoteStream),
    ChannelOpened(Arc<dyn ReliableChannel>),
}

impl fmt::Debug for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineEvent::LocalCandidate(c) => f.debug_tuple("LocalCandidate").field(c).finish(),
            EngineEvent::RemoteStream(s) => f.debug_tuple("RemoteStream").field(s).finish(),
            EngineEvent::ChannelOpened(ch) => {
                f.debug_tuple("ChannelOpened").field(&ch.label()).finish()
            }
        }
    }
}

/// A media track the peer started sending.
#[derive(Clone)]
pub struct RemoteStream {
    pub stream_id: String,
    pub track_id: String,
    /// `audio` or `video`.
    pub kind: String,
    pub track: Option<Arc<TrackRemote>>,
}

impl RemoteStream {
    /// A stream description with no media attached.
    pub fn detached(
        stream_id: impl Into<String>,
        track_id: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            stream_id: stream_id.into(),
            track_id: track_id.into(),
            kind: kind.into(),
            track: None,
        }
    }
}

impl fmt::Debug for RemoteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteStream")
            .field("stream_id", &self.stream_id)
            .field("track_id", &self.track_id)
            .field("kind", &self.kind)
            .field("attached", &self.track.is_some())
            .finish()
    }
}
