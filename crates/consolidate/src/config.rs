//! Consolidator configuration.

use crate::error::{ConsolidateError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default quiet period before a bunch of events is consolidated.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(100);

/// Default ceiling between consolidated events under continuous input.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(500);

/// Timing configuration for a consolidator.
///
/// `delay` is the minimum spacing between consolidated events (the stream
/// must go quiet for that long), `max_delay` bounds the spacing when the
/// stream never goes quiet. `delay` must be shorter than `max_delay`.
///
/// Durations are kept exactly as given. The serialized form uses whole
/// milliseconds (`delay_ms`, `max_delay_ms`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidateConfig {
    /// Trailing quiet period.
    #[serde(rename = "delay_ms", with = "millis")]
    delay: Duration,
    /// Burst ceiling, counted from the first event of a burst.
    #[serde(rename = "max_delay_ms", with = "millis")]
    max_delay: Duration,
}

impl Default for ConsolidateConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY, DEFAULT_MAX_DELAY)
    }
}

impl ConsolidateConfig {
    pub fn new(delay: Duration, max_delay: Duration) -> Self {
        Self { delay, max_delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Check that `0 < delay < max_delay`.
    pub fn validate(&self) -> Result<()> {
        if self.delay.is_zero() {
            return Err(ConsolidateError::ZeroDelay);
        }
        if self.delay >= self.max_delay {
            return Err(ConsolidateError::DelayNotBelowMax {
                delay: self.delay,
                max_delay: self.max_delay,
            });
        }
        Ok(())
    }
}

/// `Duration` <-> whole milliseconds. Serializing a duration that is not a
/// whole number of milliseconds, or does not fit in a `u64`, is an error.
mod millis {
    use serde::{ser, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        if value.subsec_nanos() % 1_000_000 != 0 {
            return Err(ser::Error::custom(format!(
                "{:?} is not a whole number of milliseconds",
                value
            )));
        }
        let ms = u64::try_from(value.as_millis())
            .map_err(|_| ser::Error::custom(format!("{:?} overflows u64 milliseconds", value)))?;
        serializer.serialize_u64(ms)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
