//! Lock-free counters for a running consolidator.

use crate::engine::FireMode;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared between producers, the consolidation loop and observers.
///
/// Shared via `Arc<ConsolidateStats>` and updated without locks.
#[derive(Debug, Default)]
pub struct ConsolidateStats {
    /// Origin markers drained by the loop.
    origin_events: AtomicU64,
    /// Notifications discarded because a marker was already pending.
    coalesced: AtomicU64,
    /// Consolidated events fired by the trailing timer.
    bunch_fires: AtomicU64,
    /// Consolidated events fired by the ceiling timer.
    frequent_fires: AtomicU64,
    /// Consolidated events the sink could not accept.
    dropped_outputs: AtomicU64,
}

impl ConsolidateStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn origin_events(&self) -> u64 {
        self.origin_events.load(Ordering::Relaxed)
    }

    pub fn coalesced(&self) -> u64 {
        self.coalesced.load(Ordering::Relaxed)
    }

    pub fn bunch_fires(&self) -> u64 {
        self.bunch_fires.load(Ordering::Relaxed)
    }

    pub fn frequent_fires(&self) -> u64 {
        self.frequent_fires.load(Ordering::Relaxed)
    }

    /// Total consolidated events fired, delivered or not.
    pub fn fires(&self) -> u64 {
        self.bunch_fires() + self.frequent_fires()
    }

    pub fn dropped_outputs(&self) -> u64 {
        self.dropped_outputs.load(Ordering::Relaxed)
    }

    pub(crate) fn record_origin(&self) {
        self.origin_events.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fire(&self, mode: FireMode) {
        match mode {
            FireMode::Bunch => self.bunch_fires.fetch_add(1, Ordering::Relaxed),
            FireMode::Frequent => self.frequent_fires.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Returns the running total of dropped outputs.
    pub(crate) fn record_dropped_output(&self) -> u64 {
        self.dropped_outputs.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Create a snapshot for serialization/display.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            origin_events: self.origin_events(),
            coalesced: self.coalesced(),
            bunch_fires: self.bunch_fires(),
            frequent_fires: self.frequent_fires(),
            dropped_outputs: self.dropped_outputs(),
        }
    }
}

/// Point-in-time copy of [`ConsolidateStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct StatsSnapshot {
    pub origin_events: u64,
    pub coalesced: u64,
    pub bunch_fires: u64,
    pub frequent_fires: u64,
    pub dropped_outputs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fire_counters_split_by_mode() {
        let stats = ConsolidateStats::new();
        stats.record_fire(FireMode::Bunch);
        stats.record_fire(FireMode::Bunch);
        stats.record_fire(FireMode::Frequent);

        assert_eq!(stats.bunch_fires(), 2);
        assert_eq!(stats.frequent_fires(), 1);
        assert_eq!(stats.fires(), 3);
    }

    #[test]
    fn test_dropped_output_returns_total() {
        let stats = ConsolidateStats::new();
        assert_eq!(stats.record_dropped_output(), 1);
        assert_eq!(stats.record_dropped_output(), 2);
        assert_eq!(stats.dropped_outputs(), 2);
    }

    #[test]
    fn test_snapshot() {
        let stats = ConsolidateStats::new();
        stats.record_origin();
        stats.record_coalesced();
        stats.record_coalesced();
        stats.record_fire(FireMode::Frequent);

        let snapshot = stats.snapshot();
        assert_eq!(
            snapshot,
            StatsSnapshot {
                origin_events: 1,
                coalesced: 2,
                bunch_fires: 0,
                frequent_fires: 1,
                dropped_outputs: 0,
            }
        );

        let json = serde_json::to_value(snapshot).unwrap();
        assert_eq!(json["coalesced"], 2);
    }
}
