//! Output adapters for consolidated events.
//!
//! A sink runs on the consolidation loop's own task, so it must return
//! promptly and must not call back into the consolidator that drives it.

use tokio::sync::mpsc;

/// Destination for consolidated events.
pub trait ConsolidatedSink: Send + 'static {
    /// Deliver one consolidated event.
    ///
    /// Returns `false` if the event was dropped.
    fn deliver(&mut self) -> bool;
}

/// Invokes a callback for every consolidated event.
pub struct CallbackSink<F> {
    action: F,
}

impl<F> CallbackSink<F>
where
    F: FnMut() + Send + 'static,
{
    pub fn new(action: F) -> Self {
        Self { action }
    }
}

impl<F> ConsolidatedSink for CallbackSink<F>
where
    F: FnMut() + Send + 'static,
{
    fn deliver(&mut self) -> bool {
        (self.action)();
        true
    }
}

impl<F> std::fmt::Debug for CallbackSink<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackSink").finish_non_exhaustive()
    }
}

/// Pushes a marker into a caller-owned bounded channel without waiting.
///
/// The channel must be sized, or drained, so it keeps up with the
/// consolidator's `delay`; a full channel drops the marker.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<()>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<()>) -> Self {
        Self { tx }
    }
}

impl ConsolidatedSink for ChannelSink {
    fn deliver(&mut self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(())) => false,
            Err(mpsc::error::TrySendError::Closed(())) => {
                tracing::debug!("consolidated event channel closed");
                false
            }
        }
    }
}

/// For consumers that drain from a plain thread, e.g. a GUI main loop.
impl ConsolidatedSink for crossbeam_channel::Sender<()> {
    fn deliver(&mut self) -> bool {
        match self.try_send(()) {
            Ok(()) => true,
            Err(crossbeam_channel::TrySendError::Full(())) => false,
            Err(crossbeam_channel::TrySendError::Disconnected(())) => {
                tracing::debug!("consolidated event channel disconnected");
                false
            }
        }
    }
}
