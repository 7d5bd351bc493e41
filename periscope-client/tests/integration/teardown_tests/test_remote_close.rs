use periscope_client::SessionState;
use periscope_core::{MessageKind, SignalingMessage};
use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::{FakePeer, MockEngineFactory, ObservedEvents, connect, mock_session, wait_closed};

#[tokio::test]
async fn test_remote_close_fires_close_observer_once() {
    init_tracing();

    let mut peer = FakePeer::start().await;
    let engine = MockEngineFactory::new();
    let session = mock_session(&peer, &engine);
    let events = ObservedEvents::attach(&session);

    connect(&session, &mut peer).await.expect("handshake failed");
    peer.close(1000, "bye");

    assert_eq!(wait_closed(&session).await, SessionState::Closed);
    let close = events.wait_for_close().await;
    assert!(close.is_graceful());
    assert_eq!(close.code, Some(1000));
    assert_eq!(close.reason, "bye");
    assert!(engine.was_closed());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(events.close_events().len(), 1);
}

#[tokio::test]
async fn test_peer_hangup_frame_ends_the_session() {
    init_tracing();

    let mut peer = FakePeer::start().await;
    let engine = MockEngineFactory::new();
    let session = mock_session(&peer, &engine);
    let events = ObservedEvents::attach(&session);

    connect(&session, &mut peer).await.expect("handshake failed");
    peer.send(SignalingMessage::hangup());

    assert_eq!(wait_closed(&session).await, SessionState::Closed);
    assert!(events.wait_for_close().await.is_graceful());
    // The viewer does not echo the hangup back.
    assert!(
        peer.drain_frames()
            .iter()
            .all(|f| f.what != MessageKind::Hangup)
    );
}

#[tokio::test]
async fn test_remote_close_before_offer() {
    init_tracing();

    let mut peer = FakePeer::start().await;
    let engine = MockEngineFactory::new();
    let session = mock_session(&peer, &engine);
    let events = ObservedEvents::attach(&session);

    session.call().await.expect("call failed");
    peer.expect_frame(MessageKind::Call).await;
    peer.close(1001, "going away");

    assert_eq!(wait_closed(&session).await, SessionState::Closed);
    let close = events.wait_for_close().await;
    assert_eq!(close.code, Some(1001));
    assert!(engine.calls().iter().all(|c| !matches!(
        c,
        crate::utils::EngineCall::SetRemoteOffer(_)
    )));
}

#[tokio::test]
async fn test_peer_close_during_offer_is_graceful() {
    init_tracing();

    let mut peer = FakePeer::start().await;
    let engine = MockEngineFactory::new().with_offer_delay(Duration::from_millis(200));
    let session = mock_session(&peer, &engine);
    let events = ObservedEvents::attach(&session);

    session.call().await.expect("call failed");
    peer.expect_frame(MessageKind::Call).await;
    peer.offer("D1");
    tokio::time::sleep(Duration::from_millis(50)).await;
    peer.close(1000, "bye");

    assert_eq!(wait_closed(&session).await, SessionState::Closed);
    let close = events.wait_for_close().await;
    assert!(close.is_graceful(), "unexpected error: {:?}", close.error);
    assert_eq!(close.code, Some(1000));
    assert!(engine.was_closed());
    assert_eq!(events.close_events().len(), 1);
}
