use periscope_client::{ConnectError, EngineError, Session, SessionError, SessionState};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::integration::init_tracing;
use crate::utils::{EngineCall, MockEngineFactory, ObservedEvents, test_config};

async fn closed_port_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("ws://{}/stream/webrtc", addr)
}

#[tokio::test]
async fn test_unreachable_endpoint_returns_connect_error() {
    init_tracing();

    let engine = MockEngineFactory::new();
    let session = Session::with_engine(
        test_config(&closed_port_endpoint().await),
        Arc::new(engine.clone()),
    );
    let events = ObservedEvents::attach(&session);

    let err = session.call().await.unwrap_err();

    assert!(matches!(err, SessionError::Connect(ConnectError::Refused(_))));
    assert_eq!(session.state(), SessionState::Failed);
    assert!(events.nothing_fired());
    assert_eq!(
        engine.calls(),
        vec![EngineCall::Create(Vec::new()), EngineCall::Close]
    );
}

#[tokio::test]
async fn test_unsupported_transport_is_rejected() {
    init_tracing();

    let engine = MockEngineFactory::new();
    let session = Session::with_engine(
        test_config("http://127.0.0.1:1/stream/webrtc"),
        Arc::new(engine.clone()),
    );

    let err = session.call().await.unwrap_err();
    assert_eq!(
        err,
        SessionError::Connect(ConnectError::UnsupportedScheme("http".into()))
    );
    assert_eq!(session.state(), SessionState::Failed);
}

#[tokio::test]
async fn test_engine_construction_failure_is_returned() {
    init_tracing();

    let engine = MockEngineFactory::failing();
    let session = Session::with_engine(
        test_config(&closed_port_endpoint().await),
        Arc::new(engine.clone()),
    );
    let events = ObservedEvents::attach(&session);

    let err = session.call().await.unwrap_err();
    assert!(matches!(err, SessionError::Engine(EngineError::Failed(_))));
    assert_eq!(session.state(), SessionState::Failed);
    assert!(events.nothing_fired());
}
