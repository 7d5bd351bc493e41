use periscope_client::{Session, SessionError, SessionState, UsageError};
use periscope_core::MessageKind;

use crate::integration::init_tracing;
use crate::utils::{FakePeer, MockEngineFactory, mock_session, test_config};

#[tokio::test]
async fn test_second_call_is_rejected() {
    init_tracing();

    let mut peer = FakePeer::start().await;
    let engine = MockEngineFactory::new();
    let session = mock_session(&peer, &engine);

    session.call().await.expect("call failed");
    peer.expect_frame(MessageKind::Call).await;

    let err = session.call().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Usage(UsageError::AlreadyCalled(_))
    ));
    // The first call is untouched.
    assert_eq!(session.state(), SessionState::AwaitingOffer);
    assert!(peer.drain_frames().is_empty());
}

#[tokio::test]
async fn test_hangup_without_call_is_rejected() {
    init_tracing();

    let session = Session::new(test_config("ws://127.0.0.1:1/stream/webrtc"));
    let err = session.hangup().unwrap_err();
    assert_eq!(
        err,
        SessionError::Usage(UsageError::NotActive(SessionState::Idle))
    );
}
