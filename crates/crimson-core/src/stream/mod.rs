// ── Reactive state streams ──
//
// Subscription types for consuming controller state changes.

mod filter;

use std::sync::Arc;

use tokio::sync::watch;

use crate::controller::Snapshot;

pub use filter::EndpointFilter;

/// A subscription to the controller's state record.
pub struct StateStream {
    receiver: watch::Receiver<Arc<Snapshot>>,
}

impl StateStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<Snapshot>>) -> Self {
        Self { receiver }
    }

    /// Wait until a snapshot satisfies `predicate`, checking the latest one first.
    /// Returns `None` if the controller shuts down before that happens.
    pub async fn wait_for(
        &mut self,
        mut predicate: impl FnMut(&Snapshot) -> bool,
    ) -> Option<Arc<Snapshot>> {
        let snap = self.receiver.wait_for(|s| predicate(s)).await.ok()?;
        Some(snap.clone())
    }
}
