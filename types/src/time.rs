//! Millisecond timestamps.
//!
//! Block times arrive as RFC 3339 strings with up to nanosecond precision.
//! Cadence math only needs milliseconds, so everything is normalised to
//! Unix epoch milliseconds (UTC) on the way in.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

/// A Unix timestamp in milliseconds since epoch (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    /// Parse an RFC 3339 timestamp such as `2024-03-01T12:00:00.123456789Z`.
    pub fn parse_rfc3339(value: &str) -> Result<Self, TypesError> {
        chrono::DateTime::parse_from_rfc3339(value)
            .map(|dt| Self(dt.timestamp_millis()))
            .map_err(|e| TypesError::InvalidTimestamp {
                value: value.to_string(),
                reason: e.to_string(),
            })
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis())
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    /// Milliseconds from `earlier` to `self` (negative if `earlier` is later).
    pub fn millis_since(&self, earlier: Timestamp) -> i64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}
