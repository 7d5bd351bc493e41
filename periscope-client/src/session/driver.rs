use crate::engine::{ConnectivityEngine, EngineEvent};
use crate::error::{ProtocolError, SendError, SessionError, TransportError};
use crate::gate::RemoteDescriptionGate;
use crate::session::candidates::CandidatePipeline;
use crate::session::command::SessionCommand;
use crate::session::observers::CloseEvent;
use crate::session::{SessionState, Shared};
use crate::signaling::{ChannelClosed, SignalingChannel};
use periscope_core::{MessageKind, SignalingMessage};
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Owns the channel and engine of one placed call and runs its state machine.
///
/// Frames, channel notifications and hangup requests arrive on one queue and
/// are handled to completion one at a time. Engine events arrive on a second
/// queue and are interleaved between commands.
pub(crate) struct Driver {
    shared: Arc<Shared>,
    channel: SignalingChannel,
    engine: Arc<dyn ConnectivityEngine>,
    gate: RemoteDescriptionGate,
    candidates: CandidatePipeline,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    events: mpsc::UnboundedReceiver<EngineEvent>,
    /// Why the session is closing, if it is not a plain hangup.
    close_error: Option<SessionError>,
}

impl Driver {
    pub(crate) fn new(
        shared: Arc<Shared>,
        channel: SignalingChannel,
        engine: Arc<dyn ConnectivityEngine>,
        commands: mpsc::UnboundedReceiver<SessionCommand>,
        faults: mpsc::UnboundedSender<SessionCommand>,
        events: mpsc::UnboundedReceiver<EngineEvent>,
    ) -> Self {
        let gate = RemoteDescriptionGate::new();
        let candidates = CandidatePipeline::spawn(shared.id, gate.clone(), engine.clone(), faults);
        Self {
            shared,
            channel,
            engine,
            gate,
            candidates,
            commands,
            events,
            close_error: None,
        }
    }

    pub(crate) async fn run(mut self) {
        debug!(session = %self.shared.id, "Session driver started");

        loop {
            let flow = tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(c) => self.handle_command(c).await,
                    None => {
                        warn!(session = %self.shared.id, "Command queue closed unexpectedly");
                        self.teardown().await;
                        ControlFlow::Break(())
                    }
                },
                Some(evt) = self.events.recv() => {
                    self.handle_engine_event(evt).await;
                    ControlFlow::Continue(())
                }
            };
            if flow.is_break() {
                break;
            }
        }

        debug!(session = %self.shared.id, "Session driver finished in {}", self.shared.state());
    }

    async fn handle_command(&mut self, cmd: SessionCommand) -> ControlFlow<()> {
        match cmd {
            SessionCommand::Frame(msg) => self.handle_frame(msg).await,
            SessionCommand::Hangup => {
                self.hangup().await;
                ControlFlow::Continue(())
            }
            SessionCommand::ChannelError(err) if self.shared.state() == SessionState::Closing => {
                debug!(session = %self.shared.id, "Signaling error while closing: {}", err);
                ControlFlow::Continue(())
            }
            SessionCommand::ChannelError(err) => {
                warn!(session = %self.shared.id, "Signaling channel error: {}", err);
                self.begin_close(Some(err.into())).await;
                ControlFlow::Continue(())
            }
            SessionCommand::ChannelClosed(closed) => {
                self.finish_close(closed).await;
                ControlFlow::Break(())
            }
            SessionCommand::Fault(err) if self.shared.state() == SessionState::Closing => {
                warn!(session = %self.shared.id, "Ignoring failure while closing: {}", err);
                ControlFlow::Continue(())
            }
            SessionCommand::Fault(err) => self.fail(err).await,
        }
    }

    async fn handle_frame(&mut self, msg: SignalingMessage) -> ControlFlow<()> {
        let state = self.shared.state();
        if state == SessionState::Closing || state.is_terminal() {
            warn!(session = %self.shared.id, "Ignoring '{}' frame while {}", msg.what, state);
            return ControlFlow::Continue(());
        }
        debug!(session = %self.shared.id, "Signaling frame: {}", msg.what);

        match msg.what {
            MessageKind::Offer => match self.handle_offer(msg.data()).await {
                Ok(()) => ControlFlow::Continue(()),
                Err(SessionError::Transport(err)) => {
                    self.begin_close(Some(err.into())).await;
                    ControlFlow::Continue(())
                }
                Err(err) => self.fail(err).await,
            },
            MessageKind::IceCandidate | MessageKind::AddIceCandidate => {
                if msg.has_data() {
                    let SignalingMessage { data, .. } = msg;
                    self.candidates.push(data.unwrap_or_default());
                } else {
                    debug!(session = %self.shared.id, "Peer finished sending candidates");
                }
                ControlFlow::Continue(())
            }
            MessageKind::IceCandidates => {
                error!(
                    session = %self.shared.id,
                    "Peer sent a non-trickle candidate batch; only trickle ICE is supported"
                );
                ControlFlow::Continue(())
            }
            MessageKind::Message => {
                self.shared.observers.message(msg.data.unwrap_or_default());
                ControlFlow::Continue(())
            }
            MessageKind::Hangup => {
                info!(session = %self.shared.id, "Peer hung up");
                self.begin_close(None).await;
                ControlFlow::Continue(())
            }
            MessageKind::Call | MessageKind::Answer => {
                warn!(session = %self.shared.id, "Unexpected '{}' frame from peer", msg.what);
                ControlFlow::Continue(())
            }
        }
    }

    async fn handle_offer(&mut self, descriptor: &str) -> Result<(), SessionError> {
        if self.gate.is_resolved() {
            return Err(ProtocolError::DuplicateOffer.into());
        }

        self.engine
            .set_remote_offer(descriptor)
            .await
            .map_err(|e| ProtocolError::InvalidOffer(e.to_string()))?;
        self.gate.resolve();
        info!(session = %self.shared.id, "Remote offer applied");
        self.shared.set_state(SessionState::Answering);

        let answer = self
            .engine
            .create_answer()
            .await
            .map_err(|e| ProtocolError::AnswerFailed(e.to_string()))?;
        match self.channel.send(&SignalingMessage::answer(answer)).await {
            Ok(()) => {}
            Err(SendError::Closed) => {
                // The peer closed while the offer was applied; its close
                // notification ends the session.
                debug!(session = %self.shared.id, "Channel closed before the answer went out");
                return Ok(());
            }
            Err(e) => return Err(TransportError::from(e).into()),
        }
        info!(session = %self.shared.id, "Answer sent");

        self.shared.set_state(SessionState::Connected);
        Ok(())
    }

    async fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::LocalCandidate(candidate) => {
                let state = self.shared.state();
                if state == SessionState::Closing || state.is_terminal() {
                    return;
                }
                let msg = match candidate {
                    Some(c) => SignalingMessage::add_ice_candidate(c),
                    None => SignalingMessage::end_of_candidates(),
                };
                match self.channel.send(&msg).await {
                    Ok(()) => {}
                    // The close notification is already on its way.
                    Err(SendError::Closed) => {}
                    Err(e) => self.begin_close(Some(TransportError::from(e).into())).await,
                }
            }
            EngineEvent::RemoteStream(stream) => {
                info!(session = %self.shared.id, "Remote stream available: {:?}", stream);
                self.shared.observers.remote_stream(stream);
            }
            EngineEvent::ChannelOpened(channel) => {
                info!(session = %self.shared.id, "Reliable channel '{}' available", channel.label());
                *self.shared.reliable.lock() = Some(channel.clone());
                self.shared.observers.reliable_channel(channel);
            }
        }
    }

    async fn hangup(&mut self) {
        if !self.shared.state().is_active() {
            return;
        }
        info!(session = %self.shared.id, "Hanging up");
        if let Err(e) = self.channel.send(&SignalingMessage::hangup()).await {
            debug!(session = %self.shared.id, "Hangup frame not delivered: {}", e);
        }
        self.begin_close(None).await;
    }

    /// Start closing the channel; teardown happens on its close notification.
    async fn begin_close(&mut self, error: Option<SessionError>) {
        if self.close_error.is_none() {
            self.close_error = error;
        }
        if self.shared.state().is_active() {
            self.shared.set_state(SessionState::Closing);
        }
        if let Err(e) = self.channel.close().await {
            warn!(session = %self.shared.id, "Failed to close signaling channel: {}", e);
        }
    }

    async fn finish_close(&mut self, closed: ChannelClosed) {
        self.teardown().await;
        self.shared.set_state(SessionState::Closed);

        let event = CloseEvent {
            error: self.close_error.take(),
            code: closed.code,
            reason: closed.reason,
        };
        info!(session = %self.shared.id, "Session closed: {:?}", event);
        self.shared.observers.close(event);
    }

    async fn fail(&mut self, err: SessionError) -> ControlFlow<()> {
        error!(session = %self.shared.id, "Session failed: {}", err);
        if let Err(e) = self.channel.close().await {
            warn!(session = %self.shared.id, "Failed to close signaling channel: {}", e);
        }
        self.teardown().await;
        self.shared.set_state(SessionState::Failed);

        self.shared.observers.close(CloseEvent {
            reason: err.to_string(),
            error: Some(err),
            code: None,
        });
        ControlFlow::Break(())
    }

    async fn teardown(&mut self) {
        self.candidates.stop();
        self.shared.reliable.lock().take();
        if let Err(e) = self.engine.close().await {
            warn!(session = %self.shared.id, "Failed to close connectivity engine: {}", e);
        }
    }
}
