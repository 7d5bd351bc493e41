use futures::{SinkExt, StreamExt};
use periscope_client::{Session, SessionError, SessionState, TransportError};
use periscope_core::{MessageKind, SignalingMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

use crate::integration::init_tracing;
use crate::utils::{
    EngineCall, FakePeer, MockEngineFactory, ObservedEvents, mock_session, test_config,
    wait_closed,
};

/// Completes the handshake, then drops the TCP connection without a close frame.
async fn run_resetting_peer(listener: TcpListener) -> anyhow::Result<()> {
    let (tcp, _) = listener.accept().await?;
    let mut ws = tokio_tungstenite::accept_async(tcp).await?;

    let call = ws.next().await.ok_or_else(|| anyhow::anyhow!("no call frame"))??;
    let call = SignalingMessage::from_json(call.to_text()?)?;
    anyhow::ensure!(call.what == MessageKind::Call, "expected call, got {}", call.what);

    let offer = SignalingMessage::with_data(MessageKind::Offer, "D1").to_json()?;
    ws.send(Message::Text(offer.into())).await?;

    let answer = ws.next().await.ok_or_else(|| anyhow::anyhow!("no answer frame"))??;
    let answer = SignalingMessage::from_json(answer.to_text()?)?;
    anyhow::ensure!(answer.what == MessageKind::Answer, "expected answer, got {}", answer.what);

    drop(ws);
    Ok(())
}

#[tokio::test]
async fn test_transport_reset_closes_with_error() {
    init_tracing();

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().expect("no local address");
    let peer = tokio::spawn(run_resetting_peer(listener));

    let engine = MockEngineFactory::new();
    let session = Session::with_engine(
        test_config(&format!("ws://{}/stream/webrtc", addr)),
        Arc::new(engine.clone()),
    );
    let events = ObservedEvents::attach(&session);

    session.call().await.expect("call failed");
    peer.await.expect("peer task panicked").expect("peer failed");

    assert_eq!(wait_closed(&session).await, SessionState::Closed);
    let close = events.wait_for_close().await;
    assert!(
        matches!(
            close.error,
            Some(SessionError::Transport(TransportError::Receive(_)))
        ),
        "unexpected close: {:?}",
        close
    );
    assert!(engine.was_closed());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(events.close_events().len(), 1);
}

#[tokio::test]
async fn test_hangup_during_offer_application() {
    init_tracing();

    let mut peer = FakePeer::start().await;
    let engine = MockEngineFactory::new().with_offer_delay(Duration::from_millis(200));
    let session = mock_session(&peer, &engine);
    let events = ObservedEvents::attach(&session);

    session.call().await.expect("call failed");
    peer.expect_frame(MessageKind::Call).await;
    peer.offer("D1");
    tokio::time::sleep(Duration::from_millis(50)).await;
    session.hangup().expect("hangup accepted");

    // The offer in flight finishes before the hangup is handled.
    peer.expect_frame(MessageKind::Answer).await;
    peer.expect_frame(MessageKind::Hangup).await;

    assert_eq!(wait_closed(&session).await, SessionState::Closed);
    assert!(events.wait_for_close().await.is_graceful());
    assert_eq!(
        engine.calls(),
        vec![
            EngineCall::Create(vec![]),
            EngineCall::SetRemoteOffer("D1".into()),
            EngineCall::CreateAnswer,
            EngineCall::Close,
        ]
    );
}

#[tokio::test]
async fn test_candidate_failure_while_closing_is_ignored() {
    init_tracing();

    let mut peer = FakePeer::start().await;
    let engine = MockEngineFactory::new().with_offer_delay(Duration::from_millis(200));
    let session = mock_session(&peer, &engine);
    let events = ObservedEvents::attach(&session);

    session.call().await.expect("call failed");
    peer.expect_frame(MessageKind::Call).await;
    peer.offer("D1");
    peer.candidate("!garbage");
    tokio::time::sleep(Duration::from_millis(50)).await;
    // Queued behind the offer, so the candidate fails only once closing began.
    session.hangup().expect("hangup accepted");

    peer.expect_frame(MessageKind::Hangup).await;
    assert_eq!(wait_closed(&session).await, SessionState::Closed);
    let close = events.wait_for_close().await;
    assert!(close.is_graceful(), "unexpected error: {:?}", close.error);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(events.close_events().len(), 1);
}
