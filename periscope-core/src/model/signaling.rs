use crate::model::options::CallOptions;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.credential = Some(credential.into());
        self
    }
}

/// The `what` discriminator of a signaling frame.
///
/// `Call`, `AddIceCandidate`, `Answer` and `Hangup` travel viewer to peer;
/// `Offer`, `IceCandidate`, `IceCandidates` and `Message` travel peer to viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageKind {
    Call,
    Offer,
    Answer,
    Message,
    AddIceCandidate,
    IceCandidate,
    IceCandidates,
    Hangup,
}

impl MessageKind {
    pub const ALL: [MessageKind; 8] = [
        MessageKind::Call,
        MessageKind::Offer,
        MessageKind::Answer,
        MessageKind::Message,
        MessageKind::AddIceCandidate,
        MessageKind::IceCandidate,
        MessageKind::IceCandidates,
        MessageKind::Hangup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Call => "call",
            MessageKind::Offer => "offer",
            MessageKind::Answer => "answer",
            MessageKind::Message => "message",
            MessageKind::AddIceCandidate => "addIceCandidate",
            MessageKind::IceCandidate => "iceCandidate",
            MessageKind::IceCandidates => "iceCandidates",
            MessageKind::Hangup => "hangup",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One JSON frame on the signaling socket.
///
/// `data` is opaque: descriptors and candidates are passed through to the
/// connectivity engine untouched. An empty string is significant (end of
/// candidates) and survives a round trip distinct from an absent field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalingMessage {
    pub what: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<CallOptions>,
}

impl SignalingMessage {
    pub fn new(what: MessageKind) -> Self {
        Self {
            what,
            data: None,
            options: None,
        }
    }

    pub fn with_data(what: MessageKind, data: impl Into<String>) -> Self {
        Self {
            what,
            data: Some(data.into()),
            options: None,
        }
    }

    pub fn call(options: CallOptions) -> Self {
        Self {
            what: MessageKind::Call,
            data: None,
            options: Some(options),
        }
    }

    pub fn answer(descriptor: impl Into<String>) -> Self {
        Self::with_data(MessageKind::Answer, descriptor)
    }

    pub fn add_ice_candidate(candidate: impl Into<String>) -> Self {
        Self::with_data(MessageKind::AddIceCandidate, candidate)
    }

    /// The empty `addIceCandidate` that tells the peer local gathering is over.
    pub fn end_of_candidates() -> Self {
        Self::with_data(MessageKind::AddIceCandidate, "")
    }

    pub fn hangup() -> Self {
        Self::new(MessageKind::Hangup)
    }

    /// Payload as a string slice; absent data reads as empty.
    pub fn data(&self) -> &str {
        self.data.as_deref().unwrap_or_default()
    }

    pub fn has_data(&self) -> bool {
        !self.data().is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
