use serde::Serialize;
use std::fmt;
use tokio::sync::watch;
use tracing::info;

/// Process lifecycle. Startup walks the first four phases in order; `Failed`
/// is terminal and reachable from any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Starting,
    StorageReady,
    IdentityReady,
    Serving,
    Failed,
}

impl Phase {
    /// The only phase a successful stage may move to.
    pub fn successor(self) -> Phase {
        match self {
            Phase::Starting => Phase::StorageReady,
            Phase::StorageReady => Phase::IdentityReady,
            Phase::IdentityReady | Phase::Serving => Phase::Serving,
            Phase::Failed => Phase::Failed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Starting => "starting",
            Phase::StorageReady => "storage_ready",
            Phase::IdentityReady => "identity_ready",
            Phase::Serving => "serving",
            Phase::Failed => "failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current phase, observable through [`Lifecycle::subscribe`].
///
/// There is no way to set an arbitrary phase: callers can only advance to the
/// successor or fail, so no stage can be skipped.
pub struct Lifecycle {
    tx: watch::Sender<Phase>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Phase::Starting);
        Self { tx }
    }

    pub fn phase(&self) -> Phase {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.tx.subscribe()
    }

    pub fn advance(&self) -> Phase {
        let mut next = Phase::Failed;
        self.tx.send_modify(|phase| {
            *phase = phase.successor();
            next = *phase;
        });
        info!(phase = %next, "lifecycle advanced");
        next
    }

    pub fn fail(&self) {
        let previous = self.tx.send_replace(Phase::Failed);
        info!(from = %previous, "lifecycle failed");
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
