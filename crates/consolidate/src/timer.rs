//! Single-shot countdown timer owned by the consolidation loop.
//!
//! A timer is just a fixed period plus an optional deadline. Every wait
//! builds a fresh `sleep_until` from the stored deadline, so re-arming
//! never observes a stale fire from a previous cycle.

use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Longest period actually waited; longer periods are clamped to it.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

#[derive(Debug)]
pub(crate) struct Timer {
    period: Duration,
    deadline: Option<Instant>,
}

impl Timer {
    /// Create a disarmed timer.
    pub(crate) fn new(period: Duration) -> Self {
        Self {
            period,
            deadline: None,
        }
    }

    /// Arm (or re-arm) the timer to fire one period from now.
    pub(crate) fn arm(&mut self) {
        self.deadline = Some(Instant::now() + self.period.min(FAR_FUTURE));
    }

    pub(crate) fn disarm(&mut self) {
        self.deadline = None;
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolves when the deadline passes. Never resolves while disarmed.
    pub(crate) async fn fired(&self) {
        match self.deadline {
            Some(deadline) => sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}
