//! Stop handle for a running consolidator.

use crate::stats::ConsolidateStats;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Controls the lifetime of one consolidation loop.
///
/// Clones share the same loop. `stop` may be called any number of times
/// from any number of callers; only the first call has an effect.
#[derive(Debug, Clone)]
pub struct StopHandle {
    cancel: CancellationToken,
    finished: CancellationToken,
    stats: Arc<ConsolidateStats>,
}

impl StopHandle {
    pub(crate) fn new(
        cancel: CancellationToken,
        finished: CancellationToken,
        stats: Arc<ConsolidateStats>,
    ) -> Self {
        Self {
            cancel,
            finished,
            stats,
        }
    }

    /// Signal the loop to stop.
    ///
    /// A consolidated event already being delivered is allowed to finish;
    /// nothing fires afterwards.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Whether the loop has exited, either through `stop` or because every
    /// intake handle was dropped.
    pub fn is_stopped(&self) -> bool {
        self.finished.is_cancelled()
    }

    /// Wait until the loop has exited.
    pub async fn stopped(&self) {
        self.finished.cancelled().await;
    }

    /// Counters of this consolidator.
    pub fn stats(&self) -> Arc<ConsolidateStats> {
        Arc::clone(&self.stats)
    }
}
