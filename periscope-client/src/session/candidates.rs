use crate::engine::ConnectivityEngine;
use crate::error::{EngineError, ProtocolError};
use crate::gate::RemoteDescriptionGate;
use crate::session::command::SessionCommand;
use periscope_core::SessionId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Applies remote candidates strictly after the remote description.
///
/// Candidates are queued in receipt order the moment their frame is handled,
/// so the driver never blocks on the gate; the pipeline task waits for the
/// gate once and then drains the queue in order.
pub(crate) struct CandidatePipeline {
    queue: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

impl CandidatePipeline {
    pub(crate) fn spawn(
        session: SessionId,
        gate: RemoteDescriptionGate,
        engine: Arc<dyn ConnectivityEngine>,
        faults: mpsc::UnboundedSender<SessionCommand>,
    ) -> Self {
        let (queue, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(apply_in_order(session, gate, engine, rx, faults));
        Self { queue, task }
    }

    pub(crate) fn push(&self, candidate: String) {
        // The receiver only goes away once the pipeline was stopped.
        let _ = self.queue.send(candidate);
    }

    pub(crate) fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for CandidatePipeline {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn apply_in_order(
    session: SessionId,
    gate: RemoteDescriptionGate,
    engine: Arc<dyn ConnectivityEngine>,
    mut rx: mpsc::UnboundedReceiver<String>,
    faults: mpsc::UnboundedSender<SessionCommand>,
) {
    gate.wait().await;
    debug!(session = %session, "Remote description set, applying queued candidates");

    while let Some(candidate) = rx.recv().await {
        match engine.add_remote_candidate(&candidate).await {
            Ok(()) => debug!(session = %session, "Remote candidate applied"),
            Err(EngineError::Malformed(reason)) => {
                let err = ProtocolError::InvalidCandidate(reason);
                let _ = faults.send(SessionCommand::Fault(err.into()));
                return;
            }
            Err(EngineError::Closed) => return,
            Err(e) => warn!(session = %session, "Failed to add remote candidate: {}", e),
        }
    }
}
