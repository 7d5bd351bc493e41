use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use periscope_client::{
    ConnectivityEngine, EngineError, EngineEvent, EngineEventSender, EngineFactory,
    ReliableChannel,
};
use periscope_core::IceServerConfig;
use std::sync::Arc;
use std::time::Duration;

/// Offer text the mock engine refuses to parse.
pub const MALFORMED_OFFER: &str = "not-an-offer";

/// Candidates starting with this prefix are refused as malformed.
pub const MALFORMED_CANDIDATE_PREFIX: &str = "!";

pub const MOCK_ANSWER: &str = "A1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Create(Vec<IceServerConfig>),
    SetRemoteOffer(String),
    CreateAnswer,
    AddCandidate(String),
    Close,
}

/// Records every engine interaction in order and lets tests raise engine events.
#[derive(Clone, Default)]
pub struct MockEngineFactory {
    calls: Arc<Mutex<Vec<EngineCall>>>,
    events: Arc<Mutex<Option<EngineEventSender>>>,
    offer_delay: Duration,
    fail_create: bool,
}

impl MockEngineFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the remote offer "in flight" for a while before it is applied.
    pub fn with_offer_delay(mut self, delay: Duration) -> Self {
        self.offer_delay = delay;
        self
    }

    pub fn failing() -> Self {
        Self {
            fail_create: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().clone()
    }

    pub fn applied_candidates(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::AddCandidate(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    pub fn was_closed(&self) -> bool {
        self.calls.lock().contains(&EngineCall::Close)
    }

    /// Raise an event as if the engine produced it.
    pub fn emit(&self, event: EngineEvent) {
        let events = self.events.lock();
        let tx = events.as_ref().expect("engine was not created yet");
        tx.send(event).expect("session stopped listening to engine events");
    }
}

#[async_trait]
impl EngineFactory for MockEngineFactory {
    async fn create(
        &self,
        ice_servers: &[IceServerConfig],
        events: EngineEventSender,
    ) -> Result<Arc<dyn ConnectivityEngine>, EngineError> {
        self.calls.lock().push(EngineCall::Create(ice_servers.to_vec()));
        if self.fail_create {
            return Err(EngineError::Failed("mock engine refused to start".into()));
        }
        *self.events.lock() = Some(events);
        Ok(Arc::new(MockEngine {
            calls: self.calls.clone(),
            offer_delay: self.offer_delay,
        }))
    }
}

pub struct MockEngine {
    calls: Arc<Mutex<Vec<EngineCall>>>,
    offer_delay: Duration,
}

#[async_trait]
impl ConnectivityEngine for MockEngine {
    async fn set_remote_offer(&self, descriptor: &str) -> Result<(), EngineError> {
        if descriptor == MALFORMED_OFFER {
            return Err(EngineError::Malformed("offer is not a session description".into()));
        }
        if !self.offer_delay.is_zero() {
            tokio::time::sleep(self.offer_delay).await;
        }
        self.calls
            .lock()
            .push(EngineCall::SetRemoteOffer(descriptor.to_owned()));
        Ok(())
    }

    async fn create_answer(&self) -> Result<String, EngineError> {
        self.calls.lock().push(EngineCall::CreateAnswer);
        Ok(MOCK_ANSWER.to_owned())
    }

    async fn add_remote_candidate(&self, candidate: &str) -> Result<(), EngineError> {
        if candidate.starts_with(MALFORMED_CANDIDATE_PREFIX) {
            return Err(EngineError::Malformed(format!("bad candidate {}", candidate)));
        }
        self.calls
            .lock()
            .push(EngineCall::AddCandidate(candidate.to_owned()));
        Ok(())
    }

    async fn close(&self) -> Result<(), EngineError> {
        self.calls.lock().push(EngineCall::Close);
        Ok(())
    }
}

/// Reliable channel that keeps whatever is sent over it.
#[derive(Default)]
pub struct MockReliableChannel {
    sent: Mutex<Vec<Bytes>>,
}

impl MockReliableChannel {
    pub fn sent(&self) -> Vec<Bytes> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl ReliableChannel for MockReliableChannel {
    fn label(&self) -> String {
        "input".to_owned()
    }

    async fn send(&self, payload: Bytes) -> Result<(), EngineError> {
        self.sent.lock().push(payload);
        Ok(())
    }
}
