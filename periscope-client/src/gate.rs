use std::sync::Arc;
use tokio::sync::watch;

/// One-shot, multi-waiter gate that opens when the remote offer is applied.
///
/// Remote candidates wait on it so they are never handed to the engine before
/// the remote description exists. Once open it stays open; waiters that arrive
/// later pass straight through.
#[derive(Clone, Debug)]
pub struct RemoteDescriptionGate {
    tx: Arc<watch::Sender<bool>>,
}

impl RemoteDescriptionGate {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Open the gate. Returns `false` if it was already open.
    pub fn resolve(&self) -> bool {
        self.tx.send_if_modified(|open| {
            if *open {
                false
            } else {
                *open = true;
                true
            }
        })
    }

    pub fn is_resolved(&self) -> bool {
        *self.tx.borrow()
    }

    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this cannot observe a drop.
        let _ = rx.wait_for(|open| *open).await;
    }
}

impl Default for RemoteDescriptionGate {
    fn default() -> Self {
        Self::new()
    }
}
