//! Event-rate consolidation for tray and UI refreshes.
//!
//! Turns a stream of frequent, payload-less "origin" events into a sparser
//! stream of "consolidated" events, suitable for driving expensive actions
//! (menu rebuilds, icon redraws, D-Bus property updates) without reacting
//! to every origin event.
//!
//! Two timings control the output:
//! - `delay`: a bunch of events separated by gaps shorter than `delay`
//!   collapses into one consolidated event, fired `delay` after the last
//!   event of the bunch;
//! - `max_delay`: if the stream never pauses for `delay`, a consolidated
//!   event still fires `max_delay` after the first event of the burst.
//!
//! # Architecture
//!
//! ```text
//! producers ──notify()──► intake (1 slot) ──► engine loop ──► sink
//!                                               ▲   (callback or channel)
//!                         StopHandle::stop() ───┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use tray_consolidate::{consolidate_fn, ConsolidateConfig};
//! use std::time::Duration;
//!
//! let config = ConsolidateConfig::new(Duration::from_millis(100), Duration::from_millis(500));
//! let (notifier, stop) = consolidate_fn(config, || rebuild_menu())?;
//!
//! notifier.notify(); // from any thread, never blocks
//! stop.stop();
//! ```

mod config;
mod engine;
mod error;
mod intake;
mod lifecycle;
mod sink;
mod stats;
mod timer;

pub use config::{ConsolidateConfig, DEFAULT_DELAY, DEFAULT_MAX_DELAY};
pub use engine::FireMode;
pub use error::{ConsolidateError, Result};
pub use intake::Notifier;
pub use lifecycle::StopHandle;
pub use sink::{CallbackSink, ChannelSink, ConsolidatedSink};
pub use stats::{ConsolidateStats, StatsSnapshot};

use engine::Engine;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Start a consolidator that delivers into `sink`.
///
/// Must be called from within a tokio runtime; the consolidation loop is
/// spawned onto it.
pub fn spawn<S>(config: ConsolidateConfig, sink: S) -> Result<(Notifier, StopHandle)>
where
    S: ConsolidatedSink,
{
    let (tx, stop) = spawn_loop(config, sink)?;
    let notifier = Notifier::new(tx, stop.stats());
    Ok((notifier, stop))
}

/// Start a consolidator that calls `action` for every consolidated event.
///
/// `action` runs on the consolidation loop's task. It must not block for
/// long and must not call back into this consolidator synchronously.
pub fn consolidate_fn<F>(config: ConsolidateConfig, action: F) -> Result<(Notifier, StopHandle)>
where
    F: FnMut() + Send + 'static,
{
    spawn(config, CallbackSink::new(action))
}

/// Start a consolidator that pushes a marker into `out` for every
/// consolidated event.
///
/// Origin events are reported by sending into the returned sender without
/// waiting (`try_send`), ignoring a full channel. `out` must be buffered, or
/// drained faster than `delay`, otherwise consolidated events are dropped.
pub fn consolidate_chan(
    config: ConsolidateConfig,
    out: mpsc::Sender<()>,
) -> Result<(mpsc::Sender<()>, StopHandle)> {
    spawn_loop(config, ChannelSink::new(out))
}

fn spawn_loop<S>(config: ConsolidateConfig, sink: S) -> Result<(mpsc::Sender<()>, StopHandle)>
where
    S: ConsolidatedSink,
{
    config.validate()?;
    let runtime =
        tokio::runtime::Handle::try_current().map_err(|_| ConsolidateError::NoRuntime)?;

    let (tx, rx) = intake::channel();
    let cancel = CancellationToken::new();
    let finished = CancellationToken::new();
    let stats = Arc::new(ConsolidateStats::new());

    let engine = Engine::new(&config, rx, sink, cancel.clone(), Arc::clone(&stats));
    let finished_guard = finished.clone().drop_guard();

    tracing::debug!(
        delay = ?config.delay(),
        max_delay = ?config.max_delay(),
        "consolidator started"
    );
    runtime.spawn(async move {
        let _finished = finished_guard;
        engine.run().await;
    });

    Ok((tx, StopHandle::new(cancel, finished, stats)))
}
