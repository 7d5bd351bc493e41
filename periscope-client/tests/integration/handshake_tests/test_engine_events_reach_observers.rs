use bytes::Bytes;
use periscope_client::{EngineEvent, RemoteStream, SessionError, SessionState};
use periscope_core::{MessageKind, SignalingMessage};
use std::sync::Arc;
use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::{
    FakePeer, MockEngineFactory, MockReliableChannel, ObservedEvents, connect, mock_session,
};

async fn settle<F: Fn() -> bool>(done: F) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !done() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition was not reached");
}

#[tokio::test]
async fn test_stream_and_channel_observers_fire_independently() {
    init_tracing();

    let mut peer = FakePeer::start().await;
    let engine = MockEngineFactory::new();
    let session = mock_session(&peer, &engine);
    let events = ObservedEvents::attach(&session);

    connect(&session, &mut peer).await.expect("handshake failed");

    let channel = Arc::new(MockReliableChannel::default());
    engine.emit(EngineEvent::ChannelOpened(channel.clone()));
    settle(|| !events.channels.lock().is_empty()).await;
    assert!(events.streams.lock().is_empty());

    engine.emit(EngineEvent::RemoteStream(RemoteStream::detached(
        "stream", "video0", "video",
    )));
    settle(|| !events.streams.lock().is_empty()).await;

    assert_eq!(*events.channels.lock(), vec!["input".to_owned()]);
    assert_eq!(events.streams.lock()[0].track_id, "video0");
    assert_eq!(session.state(), SessionState::Connected);
}

#[tokio::test]
async fn test_send_input_requires_open_channel() {
    init_tracing();

    let mut peer = FakePeer::start().await;
    let engine = MockEngineFactory::new();
    let session = mock_session(&peer, &engine);
    let events = ObservedEvents::attach(&session);

    let err = session.send_input(Bytes::from_static(b"early")).await.unwrap_err();
    assert!(matches!(err, SessionError::ChannelNotOpen(_)));

    connect(&session, &mut peer).await.expect("handshake failed");
    let err = session.send_input(Bytes::from_static(b"early")).await.unwrap_err();
    assert!(matches!(err, SessionError::ChannelNotOpen(_)));

    let channel = Arc::new(MockReliableChannel::default());
    engine.emit(EngineEvent::ChannelOpened(channel.clone()));
    settle(|| !events.channels.lock().is_empty()).await;

    session
        .send_input(Bytes::from_static(b"{\"keycodes\":[30]}"))
        .await
        .expect("send over open channel");
    assert_eq!(channel.sent(), vec![Bytes::from_static(b"{\"keycodes\":[30]}")]);

    peer.close(1000, "done");
    events.wait_for_close().await;
    let err = session.send_input(Bytes::from_static(b"late")).await.unwrap_err();
    assert!(matches!(err, SessionError::ChannelNotOpen(_)));
}

#[tokio::test]
async fn test_peer_messages_pass_through() {
    init_tracing();

    let mut peer = FakePeer::start().await;
    let engine = MockEngineFactory::new();
    let session = mock_session(&peer, &engine);
    let events = ObservedEvents::attach(&session);

    session.call().await.expect("call failed");
    peer.expect_frame(MessageKind::Call).await;

    peer.send(SignalingMessage::with_data(MessageKind::Message, "camera busy"));
    settle(|| !events.messages.lock().is_empty()).await;

    assert_eq!(*events.messages.lock(), vec!["camera busy".to_owned()]);
    assert_eq!(session.state(), SessionState::AwaitingOffer);
}
