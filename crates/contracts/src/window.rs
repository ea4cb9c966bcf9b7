//! TimeWindow - fixed-width, wall-clock-aligned interval.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed-width time window aligned to a width boundary relative to the epoch.
///
/// Windows batch frame discovery (10 min) and reconciliation (10 s). The
/// alignment invariant means a 10 min window always starts at minute 0, 10,
/// 20, ... and a 10 s window at second 0, 10, 20, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Window start (UTC), aligned to a `width` boundary
    pub start: DateTime<Utc>,

    /// Window width
    #[serde(with = "timedelta_seconds")]
    pub width: TimeDelta,
}

impl TimeWindow {
    /// Create a window whose start is `instant` aligned down to the nearest
    /// `width` boundary relative to the epoch.
    pub fn containing(instant: DateTime<Utc>, width: TimeDelta) -> Self {
        Self {
            start: align_down(instant, width),
            width,
        }
    }

    /// Exclusive end of the window.
    pub fn end(&self) -> DateTime<Utc> {
        self.start + self.width
    }

    /// The immediately following window of the same width.
    pub fn next(&self) -> Self {
        Self {
            start: self.end(),
            width: self.width,
        }
    }

    /// Whether `instant` falls inside `[start, end)`.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} +{}s]",
            self.start.format("%Y-%m-%dT%H:%M:%SZ"),
            self.width.num_seconds()
        )
    }
}

/// Align `instant` down to the nearest `width` boundary relative to the epoch.
pub fn align_down(instant: DateTime<Utc>, width: TimeDelta) -> DateTime<Utc> {
    let width_us = width.num_microseconds().unwrap_or(i64::MAX).max(1);
    let since_epoch = instant.timestamp_micros();
    let aligned = since_epoch.div_euclid(width_us) * width_us;
    DateTime::from_timestamp_micros(aligned).unwrap_or(instant)
}

mod timedelta_seconds {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(width: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(width.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeDelta, D::Error> {
        let seconds = i64::deserialize(deserializer)?;
        Ok(TimeDelta::seconds(seconds))
    }
}
