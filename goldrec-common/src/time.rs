//! Timestamp utilities

use chrono::{DateTime, Duration, Utc};

/// True when `end` is at least `days` full days after `start`
pub fn spans_at_least(start: DateTime<Utc>, end: DateTime<Utc>, days: i64) -> bool {
    end - start >= Duration::days(days)
}
