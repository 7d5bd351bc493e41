use crate::engine::{
    ConnectivityEngine, EngineEvent, EngineEventSender, EngineFactory, ReliableChannel,
    RemoteStream,
};
use crate::error::EngineError;
use async_trait::async_trait;
use bytes::Bytes;
use periscope_core::IceServerConfig;
use std::sync::Arc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_remote::TrackRemote;

/// Builds a [`WebrtcEngine`] per session.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebrtcEngineFactory;

#[async_trait]
impl EngineFactory for WebrtcEngineFactory {
    async fn create(
        &self,
        ice_servers: &[IceServerConfig],
        events: EngineEventSender,
    ) -> Result<Arc<dyn ConnectivityEngine>, EngineError> {
        let engine = WebrtcEngine::new(ice_servers, events).await?;
        Ok(Arc::new(engine))
    }
}

/// Answering side of one peer connection.
///
/// Descriptors travel as JSON `RTCSessionDescription` objects and candidates
/// as JSON `RTCIceCandidateInit` objects, which is how browsers serialize them.
pub struct WebrtcEngine {
    peer_connection: Arc<RTCPeerConnection>,
}

impl WebrtcEngine {
    pub async fn new(
        ice_servers: &[IceServerConfig],
        events: EngineEventSender,
    ) -> Result<Self, EngineError> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers.iter().map(to_rtc_ice_server).collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                Box::pin(async move {
                    info!("Peer connection state changed: {}", s);
                })
            },
        ));

        let ice_tx = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            Box::pin(async move {
                let encoded = match c {
                    Some(candidate) => match encode_candidate(&candidate) {
                        Some(text) => Some(text),
                        None => return,
                    },
                    None => None,
                };
                let _ = tx.send(EngineEvent::LocalCandidate(encoded));
            })
        }));

        let track_tx = events.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                Box::pin(async move {
                    let stream = RemoteStream {
                        stream_id: track.stream_id(),
                        track_id: track.id(),
                        kind: track.kind().to_string(),
                        track: Some(track),
                    };
                    debug!("Remote track added: {:?}", stream);
                    let _ = tx.send(EngineEvent::RemoteStream(stream));
                })
            },
        ));

        let dc_tx = events;
        peer_connection.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
            let tx = dc_tx.clone();
            Box::pin(async move {
                debug!("Data channel '{}' announced by peer", dc.label());

                let dc_on_open = dc.clone();
                dc.on_open(Box::new(move || {
                    let tx = tx.clone();
                    let channel = DataChannelHandle(dc_on_open.clone());
                    Box::pin(async move {
                        info!("Data channel '{}' open", channel.0.label());
                        let _ = tx.send(EngineEvent::ChannelOpened(Arc::new(channel)));
                    })
                }));
            })
        }));

        Ok(Self { peer_connection })
    }
}

#[async_trait]
impl ConnectivityEngine for WebrtcEngine {
    async fn set_remote_offer(&self, descriptor: &str) -> Result<(), EngineError> {
        let desc: RTCSessionDescription = serde_json::from_str(descriptor)
            .map_err(|e| EngineError::Malformed(format!("offer: {}", e)))?;
        if desc.sdp_type != RTCSdpType::Offer {
            return Err(EngineError::Malformed(format!(
                "expected an offer, got {}",
                desc.sdp_type
            )));
        }
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn create_answer(&self) -> Result<String, EngineError> {
        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection.set_local_description(answer).await?;

        let committed = self
            .peer_connection
            .local_description()
            .await
            .ok_or_else(|| EngineError::Failed("local description was not committed".into()))?;
        serde_json::to_string(&committed).map_err(|e| EngineError::Failed(e.to_string()))
    }

    async fn add_remote_candidate(&self, candidate: &str) -> Result<(), EngineError> {
        let init: RTCIceCandidateInit = serde_json::from_str(candidate)
            .map_err(|e| EngineError::Malformed(format!("candidate: {}", e)))?;
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), EngineError> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

/// The peer-announced data channel, once open.
pub struct DataChannelHandle(Arc<RTCDataChannel>);

#[async_trait]
impl ReliableChannel for DataChannelHandle {
    fn label(&self) -> String {
        self.0.label().to_owned()
    }

    async fn send(&self, payload: Bytes) -> Result<(), EngineError> {
        self.0.send(&payload).await?;
        Ok(())
    }
}

fn encode_candidate(candidate: &RTCIceCandidate) -> Option<String> {
    let init = match candidate.to_json() {
        Ok(init) => init,
        Err(e) => {
            warn!("Dropping local candidate that failed to serialize: {}", e);
            return None;
        }
    };
    serde_json::to_string(&init).ok()
}

fn to_rtc_ice_server(server: &IceServerConfig) -> RTCIceServer {
    RTCIceServer {
        urls: server.urls.clone(),
        username: server.username.clone().unwrap_or_default(),
        credential: server.credential.clone().unwrap_or_default(),
    }
}
