//! Trailing day windows for time-series aggregation.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Half-open interval `[start, end)` covering one day of a report window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Month and calendar day of `start`, e.g. `05-09`
    pub label: String,
}

impl DayBucket {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

/// The `n` most recent 24h buckets ending now, oldest first.
pub fn last_days_intervals(n: usize) -> Vec<DayBucket> {
    last_days_intervals_at(n, Utc::now())
}

/// The `n` 24h buckets ending at `now`, oldest first.
///
/// Buckets are contiguous: each bucket's `end` is the next bucket's `start`,
/// the last ends at `now` and the first starts exactly `n` days earlier.
pub fn last_days_intervals_at(n: usize, now: DateTime<Utc>) -> Vec<DayBucket> {
    (0..n as i64)
        .rev()
        .map(|days_back| {
            let end = now - Duration::days(days_back);
            let start = end - Duration::days(1);
            DayBucket {
                start,
                end,
                label: start.format("%m-%d").to_string(),
            }
        })
        .collect()
}

/// Human description of a report window, e.g. `From 2024-05-03 to 2024-05-10`.
pub fn period_label(from: DateTime<Utc>, to: DateTime<Utc>) -> String {
    format!("From {} to {}", from.format("%Y-%m-%d"), to.format("%Y-%m-%d"))
}
