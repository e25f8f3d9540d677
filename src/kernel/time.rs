use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Device time of a command, nanoseconds since the Unix epoch.
/// Every deadline in the scope tree is evaluated against this value, never against a wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp {
    pub nanos: u64,
}

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp { nanos: 0 };

    pub fn now() -> Self {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self::from_duration(since_epoch)
    }

    pub fn from_millis(millis: u64) -> Self {
        Timestamp { nanos: millis.saturating_mul(1_000_000) }
    }

    pub fn from_secs(secs: u64) -> Self {
        Timestamp { nanos: secs.saturating_mul(1_000_000_000) }
    }

    pub fn from_duration(duration: Duration) -> Self {
        Timestamp { nanos: u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX) }
    }

    pub fn as_millis(&self) -> u64 {
        self.nanos / 1_000_000
    }

    /// Time elapsed since `earlier`. Saturates to zero when `earlier` is in the future.
    pub fn since(&self, earlier: Timestamp) -> Duration {
        Duration::from_nanos(self.nanos.saturating_sub(earlier.nanos))
    }

    pub fn plus(&self, duration: Duration) -> Self {
        let add = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        Timestamp { nanos: self.nanos.saturating_add(add) }
    }
}

/// Nanosecond count of a duration, clamped into `i64` for event payloads.
pub fn duration_nanos(duration: Duration) -> i64 {
    i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX)
}
