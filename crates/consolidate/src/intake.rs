//! Coalescing intake for origin events.

use crate::stats::ConsolidateStats;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Capacity of the intake slot. One pending marker is enough to remember
/// that "something happened" since the loop last looked.
pub(crate) const INTAKE_CAPACITY: usize = 1;

/// Create the intake slot.
pub(crate) fn channel() -> (mpsc::Sender<()>, mpsc::Receiver<()>) {
    mpsc::channel(INTAKE_CAPACITY)
}

/// Producer handle for reporting origin events.
///
/// Cheap to clone and safe to use from any thread, async or not.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::Sender<()>,
    stats: Option<Arc<ConsolidateStats>>,
}

impl Notifier {
    pub(crate) fn new(tx: mpsc::Sender<()>, stats: Arc<ConsolidateStats>) -> Self {
        Self {
            tx,
            stats: Some(stats),
        }
    }

    /// Report one origin event.
    ///
    /// Never blocks. If a marker is already pending the call is absorbed
    /// into it.
    pub fn notify(&self) {
        match self.tx.try_send(()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(())) => {
                if let Some(stats) = &self.stats {
                    stats.record_coalesced();
                }
            }
            Err(mpsc::error::TrySendError::Closed(())) => {
                tracing::trace!("consolidator stopped, origin event discarded");
            }
        }
    }

    /// Whether the consolidation loop has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl From<mpsc::Sender<()>> for Notifier {
    /// Wrap a raw intake sender, such as the one returned by
    /// [`consolidate_chan`](crate::consolidate_chan). Coalesced
    /// notifications are not counted for wrapped senders.
    fn from(tx: mpsc::Sender<()>) -> Self {
        Self { tx, stats: None }
    }
}
