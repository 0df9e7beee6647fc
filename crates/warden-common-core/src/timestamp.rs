//! Timestamp utilities.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A UTC timestamp.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// From a DateTime.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Get the inner DateTime.
    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Current time, but strictly later than `self`.
    ///
    /// Falls back to one microsecond past `self` when the clock has not
    /// moved forward.
    pub fn advanced(&self) -> Self {
        let now = Utc::now();
        if now > self.0 {
            Self(now)
        } else {
            Self(self.0 + Duration::microseconds(1))
        }
    }

    /// ISO 8601 string.
    pub fn to_iso8601(&self) -> String {
        self.0.to_rfc3339()
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_iso8601())
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_serialization() {
        let ts = Timestamp::now();
        let json = serde_json::to_string(&ts).unwrap();
        let deserialized: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, deserialized);
    }

    #[test]
    fn test_timestamp_display() {
        let display_str = Timestamp::now().to_string();
        assert!(display_str.contains('T'));
        assert!(display_str.ends_with('Z') || display_str.ends_with("+00:00"));
    }

    #[test]
    fn test_advanced_is_strictly_later() {
        let ts = Timestamp::now();
        let next = ts.advanced();
        assert!(next > ts);
        assert!(next.advanced() > next);
    }

    #[test]
    fn test_advanced_from_future_value() {
        let future = Timestamp::from_datetime(Utc::now() + Duration::hours(1));
        assert_eq!(
            future.advanced().as_datetime() - future.as_datetime(),
            Duration::microseconds(1)
        );
    }
}
