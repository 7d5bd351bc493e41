use crate::config::SessionConfig;
use crate::engine::{EngineFactory, ReliableChannel, RemoteStream, WebrtcEngineFactory};
use crate::error::{ChannelNotOpenError, SessionError, TransportError, UsageError};
use crate::session::command::SessionCommand;
use crate::session::driver::Driver;
use crate::session::observers::CloseEvent;
use crate::session::{SessionState, Shared};
use crate::signaling::SignalingChannel;
use bytes::Bytes;
use parking_lot::Mutex;
use periscope_core::{SessionId, SignalingMessage};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

/// One call attempt against a remote peer.
///
/// A session is good for exactly one [`call`](Session::call); place a new
/// call by building a new session. Everything after `call` returns happens on
/// a background task; observe it through the `on_*` registrations,
/// [`state`](Session::state) or [`wait_closed`](Session::wait_closed).
pub struct Session {
    shared: Arc<Shared>,
    config: SessionConfig,
    factory: Arc<dyn EngineFactory>,
    commands: mpsc::UnboundedSender<SessionCommand>,
    inbox: Mutex<Option<mpsc::UnboundedReceiver<SessionCommand>>>,
}

impl Session {
    /// A session backed by the `webrtc` crate.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_engine(config, Arc::new(WebrtcEngineFactory))
    }

    pub fn with_engine(config: SessionConfig, factory: Arc<dyn EngineFactory>) -> Self {
        let (commands, inbox) = mpsc::unbounded_channel();
        Self {
            shared: Arc::new(Shared::new(SessionId::new())),
            config,
            factory,
            commands,
            inbox: Mutex::new(Some(inbox)),
        }
    }

    pub fn id(&self) -> SessionId {
        self.shared.id
    }

    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Receiver that observes every state change.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.shared.state.subscribe()
    }

    /// Open the signaling channel and ask the peer for a call.
    ///
    /// Returns once the `call` frame was sent; the handshake continues in the
    /// background. On error the session is left `Failed` and nothing stays
    /// open, and no observer fires.
    pub async fn call(&self) -> Result<(), SessionError> {
        if !self.shared.transition(SessionState::Idle, SessionState::Dialing) {
            return Err(UsageError::AlreadyCalled(self.state()).into());
        }
        let id = self.shared.id;
        info!(session = %id, "Calling {} with {:?}", self.config.endpoint, self.config.options);

        let Some(inbox) = self.inbox.lock().take() else {
            return Err(UsageError::AlreadyCalled(self.state()).into());
        };

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let engine = match self.factory.create(&self.config.ice_servers, events_tx).await {
            Ok(engine) => engine,
            Err(e) => return Err(self.abandon(e.into())),
        };

        let channel =
            match SignalingChannel::open(&self.config.endpoint, self.config.connect_timeout).await {
                Ok(channel) => channel.with_close_grace(self.config.close_grace),
                Err(e) => {
                    if let Err(close_err) = engine.close().await {
                        warn!(session = %id, "Failed to close connectivity engine: {}", close_err);
                    }
                    return Err(self.abandon(e.into()));
                }
            };

        if let Err(e) = channel.send(&SignalingMessage::call(self.config.options)).await {
            if let Err(close_err) = channel.close().await {
                warn!(session = %id, "Failed to close signaling channel: {}", close_err);
            }
            if let Err(close_err) = engine.close().await {
                warn!(session = %id, "Failed to close connectivity engine: {}", close_err);
            }
            return Err(self.abandon(TransportError::from(e).into()));
        }

        let frames = self.commands.clone();
        channel.on_message(move |msg| {
            let _ = frames.send(SessionCommand::Frame(msg));
        });
        let closes = self.commands.clone();
        channel.on_close(move |closed| {
            let _ = closes.send(SessionCommand::ChannelClosed(closed));
        });
        let errors = self.commands.clone();
        channel.on_error(move |err| {
            let _ = errors.send(SessionCommand::ChannelError(err));
        });

        self.shared.transition(SessionState::Dialing, SessionState::AwaitingOffer);
        let driver = Driver::new(
            self.shared.clone(),
            channel,
            engine,
            inbox,
            self.commands.clone(),
            events_rx,
        );
        tokio::spawn(driver.run());
        Ok(())
    }

    /// Ask the peer to end the call and close the channel.
    ///
    /// Returns immediately; the session reaches `Closed` once the channel
    /// confirms. Hanging up while already closing does nothing.
    pub fn hangup(&self) -> Result<(), SessionError> {
        match self.state() {
            SessionState::Closing => Ok(()),
            state if state.is_active() => {
                let _ = self.commands.send(SessionCommand::Hangup);
                Ok(())
            }
            state => Err(UsageError::NotActive(state).into()),
        }
    }

    /// Forward an already encoded input payload over the reliable channel.
    pub async fn send_input(&self, payload: Bytes) -> Result<(), SessionError> {
        let channel = self
            .shared
            .reliable
            .lock()
            .clone()
            .ok_or(ChannelNotOpenError)?;
        channel.send(payload).await?;
        Ok(())
    }

    /// Resolves with `Closed` or `Failed` once the session has ended.
    pub async fn wait_closed(&self) -> SessionState {
        let mut rx = self.shared.state.subscribe();
        match rx.wait_for(|state| state.is_terminal()).await {
            Ok(state) => *state,
            Err(_) => self.state(),
        }
    }

    pub fn on_remote_stream<F>(&self, handler: F)
    where
        F: Fn(RemoteStream) + Send + Sync + 'static,
    {
        self.shared.observers.set_remote_stream(Box::new(handler));
    }

    pub fn on_reliable_channel<F>(&self, handler: F)
    where
        F: Fn(Arc<dyn ReliableChannel>) + Send + Sync + 'static,
    {
        self.shared.observers.set_reliable_channel(Box::new(handler));
    }

    /// Application messages from the peer, passed through untouched.
    pub fn on_message<F>(&self, handler: F)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        self.shared.observers.set_message(Box::new(handler));
    }

    pub fn on_close<F>(&self, handler: F)
    where
        F: Fn(CloseEvent) + Send + Sync + 'static,
    {
        self.shared.observers.set_close(Box::new(handler));
    }

    fn abandon(&self, err: SessionError) -> SessionError {
        error!(session = %self.shared.id, "Call failed: {}", err);
        self.shared.set_state(SessionState::Failed);
        err
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.state().is_active() {
            let _ = self.commands.send(SessionCommand::Hangup);
        }
    }
}
