//! Error types for consolidator construction.

use std::time::Duration;
use thiserror::Error;

/// Result type for consolidator construction.
pub type Result<T> = std::result::Result<T, ConsolidateError>;

/// Errors that can occur while building a consolidator.
///
/// Running consolidators never fail: dropped notifications and dropped
/// consolidated events are counted in the stats instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsolidateError {
    /// The trailing delay was zero.
    #[error("delay must be greater than zero")]
    ZeroDelay,

    /// The trailing delay was not strictly shorter than the ceiling.
    #[error("delay ({delay:?}) must be shorter than max delay ({max_delay:?})")]
    DelayNotBelowMax { delay: Duration, max_delay: Duration },

    /// No tokio runtime was available to spawn the consolidation loop on.
    #[error("no tokio runtime available to run the consolidation loop")]
    NoRuntime,
}
