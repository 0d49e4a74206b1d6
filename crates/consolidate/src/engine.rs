//! The consolidation loop.
//!
//! Two timers drive the state machine:
//! - the trailing timer (`delay`) is re-armed by every origin event and
//!   fires once the stream has been quiet for `delay`;
//! - the ceiling timer (`max_delay`) is armed by the first event of a burst
//!   and never re-armed within it, so a stream that never goes quiet still
//!   produces a consolidated event at least every `max_delay`.
//!
//! ```text
//!            origin event (arm trailing + ceiling)
//!   Idle ─────────────────────────────────────────► BurstActive
//!    ▲                                                │    ▲
//!    │   trailing fired (Bunch) / ceiling fired       │    │ origin event
//!    │   (Frequent): deliver, disarm both timers      │    │ (re-arm trailing)
//!    └────────────────────────────────────────────────┘────┘
//! ```
//!
//! Whichever timer fires, both are disarmed. A trailing timer left over
//! from before a ceiling fire would otherwise produce a second event right
//! after the first one.
//!
//! Branch priority: cancellation, then the timers, then the intake. An
//! origin event arriving at the same instant as a deadline opens the next
//! window instead of being absorbed by the one that is closing.

use crate::config::ConsolidateConfig;
use crate::sink::ConsolidatedSink;
use crate::stats::ConsolidateStats;
use crate::timer::Timer;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Which timer produced a consolidated event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FireMode {
    /// The origin stream went quiet for `delay`.
    Bunch,
    /// The burst lasted `max_delay` without a quiet gap.
    Frequent,
}

/// Why the loop exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitReason {
    Cancelled,
    IntakeClosed,
}

pub(crate) struct Engine<S> {
    intake: mpsc::Receiver<()>,
    intake_open: bool,
    sink: S,
    cancel: CancellationToken,
    stats: Arc<ConsolidateStats>,
    trailing: Timer,
    ceiling: Timer,
}

impl<S: ConsolidatedSink> Engine<S> {
    pub(crate) fn new(
        config: &ConsolidateConfig,
        intake: mpsc::Receiver<()>,
        sink: S,
        cancel: CancellationToken,
        stats: Arc<ConsolidateStats>,
    ) -> Self {
        Self {
            intake,
            intake_open: true,
            sink,
            cancel,
            stats,
            trailing: Timer::new(config.delay()),
            ceiling: Timer::new(config.max_delay()),
        }
    }

    /// A burst is active while the ceiling is armed.
    fn is_idle(&self) -> bool {
        !self.ceiling.is_armed()
    }

    /// Run until cancelled, or until the intake is closed and no burst is
    /// pending.
    pub(crate) async fn run(mut self) {
        let reason = loop {
            if !self.intake_open && self.is_idle() {
                break ExitReason::IntakeClosed;
            }

            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break ExitReason::Cancelled,

                _ = self.trailing.fired(), if self.trailing.is_armed() => {
                    self.fire(FireMode::Bunch);
                }

                _ = self.ceiling.fired(), if self.ceiling.is_armed() => {
                    self.fire(FireMode::Frequent);
                }

                received = self.intake.recv(), if self.intake_open => match received {
                    Some(()) => self.on_origin_event(),
                    None => {
                        tracing::debug!(pending = !self.is_idle(), "consolidator intake closed");
                        self.intake_open = false;
                    }
                },
            }
        };

        self.trailing.disarm();
        self.ceiling.disarm();
        tracing::debug!(?reason, "consolidator stopped");
    }

    fn on_origin_event(&mut self) {
        self.stats.record_origin();
        self.trailing.arm();
        if self.is_idle() {
            tracing::trace!("burst started");
            self.ceiling.arm();
        }
    }

    fn fire(&mut self, mode: FireMode) {
        self.trailing.disarm();
        self.ceiling.disarm();
        self.stats.record_fire(mode);
        tracing::trace!(?mode, "consolidated event");

        if !self.sink.deliver() {
            let dropped = self.stats.record_dropped_output();
            // Rate-limit logging: only log every 10th drop to avoid spam
            if dropped % 10 == 1 {
                tracing::warn!(dropped, ?mode, "consolidated event sink full, dropping events");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::CallbackSink;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn engine(
        count: Arc<AtomicUsize>,
    ) -> (mpsc::Sender<()>, Engine<CallbackSink<impl FnMut() + Send + 'static>>) {
        let (tx, rx) = crate::intake::channel();
        let config = ConsolidateConfig::new(Duration::from_millis(100), Duration::from_millis(500));
        let sink = CallbackSink::new(move || {
            count.fetch_add(1, Ordering::SeqCst);
        });
        let engine = Engine::new(
            &config,
            rx,
            sink,
            CancellationToken::new(),
            Arc::new(ConsolidateStats::new()),
        );
        (tx, engine)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_event_starts_burst() {
        let (_tx, mut engine) = engine(Arc::new(AtomicUsize::new(0)));
        assert!(engine.is_idle());

        engine.on_origin_event();
        assert!(!engine.is_idle());
        assert!(engine.trailing.is_armed());
        assert_eq!(engine.stats.origin_events(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fire_returns_to_idle() {
        let count = Arc::new(AtomicUsize::new(0));
        let (_tx, mut engine) = engine(Arc::clone(&count));

        engine.on_origin_event();
        engine.fire(FireMode::Frequent);

        assert!(engine.is_idle());
        assert!(!engine.trailing.is_armed());
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(engine.stats.frequent_fires(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_exits_when_idle_and_intake_dropped() {
        let count = Arc::new(AtomicUsize::new(0));
        let (tx, engine) = engine(Arc::clone(&count));
        drop(tx);

        engine.run().await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_exits_on_cancel() {
        let count = Arc::new(AtomicUsize::new(0));
        let (tx, engine) = engine(Arc::clone(&count));
        tx.try_send(()).unwrap();
        engine.cancel.cancel();

        engine.run().await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        drop(tx);
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_at_ceiling_deadline_opens_next_window() {
        let count = Arc::new(AtomicUsize::new(0));
        let (tx, mut engine) = engine(Arc::clone(&count));
        let stats = Arc::clone(&engine.stats);
        let cancel = engine.cancel.clone();

        engine.on_origin_event();
        tokio::time::sleep(Duration::from_millis(450)).await;
        engine.on_origin_event();
        tokio::time::sleep(Duration::from_millis(50)).await;
        // Ceiling deadline and a new marker are ready at the same instant;
        // the trailing timer is still 50ms out.
        tx.try_send(()).unwrap();

        let task = tokio::spawn(engine.run());
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(stats.frequent_fires(), 1);
        assert_eq!(stats.bunch_fires(), 1, "the marker must start a new burst");
        assert_eq!(count.load(Ordering::SeqCst), 2);

        cancel.cancel();
        task.await.unwrap();
    }

    #[test]
    fn test_fire_mode_serializes_snake_case() {
        assert_eq!(serde_json::to_value(FireMode::Bunch).unwrap(), "bunch");
        assert_eq!(serde_json::to_value(FireMode::Frequent).unwrap(), "frequent");
    }
}
