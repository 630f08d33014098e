//! Read-only view of a bridge for presentation layers

use futures::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::types::{BridgePhase, BridgeState, LinkStatus};

/// Cloneable, read-only handle to a bridge's published state.
///
/// Reads copy the current snapshot out while briefly holding the channel
/// lock, so a reader never waits on serial or network I/O.
#[derive(Debug, Clone)]
pub struct StateHandle {
    state: watch::Receiver<BridgeState>,
    phase: watch::Receiver<BridgePhase>,
}

impl StateHandle {
    pub(crate) fn new(
        state: watch::Receiver<BridgeState>,
        phase: watch::Receiver<BridgePhase>,
    ) -> Self {
        Self { state, phase }
    }

    /// Copy of the latest state.
    pub fn snapshot(&self) -> BridgeState {
        *self.state.borrow()
    }

    pub fn phase(&self) -> BridgePhase {
        *self.phase.borrow()
    }

    pub fn link_status(&self) -> LinkStatus {
        self.snapshot().link_status()
    }

    /// Wait for the next state update and return it.
    ///
    /// Returns `None` once the owning bridge has been dropped.
    pub async fn changed(&mut self) -> Option<BridgeState> {
        self.state.changed().await.ok()?;
        Some(*self.state.borrow_and_update())
    }

    /// Stream of snapshots, starting with the current one.
    ///
    /// Slow consumers skip intermediate states rather than queueing them.
    pub fn updates(&self) -> impl Stream<Item = BridgeState> + 'static {
        WatchStream::new(self.state.clone())
    }
}
