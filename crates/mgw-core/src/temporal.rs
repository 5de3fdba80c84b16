//! # Arrival Timestamps
//!
//! `RequestTime` records when a call arrived. Templates see it two ways:
//! as epoch milliseconds (`context.requestTimeEpoch`) and as a
//! common-log-format string (`context.requestTime`).

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// UTC arrival time of one inbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestTime(DateTime<Utc>);

impl RequestTime {
    /// Capture the current UTC time.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Wrap an existing UTC instant.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Build from milliseconds since the Unix epoch.
    ///
    /// Returns `None` if the value is outside chrono's representable range.
    pub fn from_epoch_millis(millis: i64) -> Option<Self> {
        Utc.timestamp_millis_opt(millis).single().map(Self)
    }

    /// Milliseconds since the Unix epoch.
    pub fn epoch_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Common log format, e.g. `09/Apr/2015:12:34:56 +0000`.
    pub fn clf(&self) -> String {
        self.0.format("%d/%b/%Y:%H:%M:%S %z").to_string()
    }

    /// Access the underlying `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_millis_round_trips() {
        let t = RequestTime::from_epoch_millis(1_428_582_896_000).unwrap();
        assert_eq!(t.epoch_millis(), 1_428_582_896_000);
    }

    #[test]
    fn clf_format() {
        let t = RequestTime::from_epoch_millis(1_428_582_896_000).unwrap();
        assert_eq!(t.clf(), "09/Apr/2015:12:34:56 +0000");
    }

    #[test]
    fn now_is_after_2020() {
        assert!(RequestTime::now().epoch_millis() > 1_577_836_800_000);
    }
}
