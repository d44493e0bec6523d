//! Time-of-day arithmetic shared by the matcher and the window checks

use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

/// `start + offset`, saturating at the end of representable time.
pub fn offset(start: DateTime<Utc>, offset: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(offset)
        .ok()
        .and_then(|delta| start.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Elapsed time from `from` to `to`, or `None` when `to` is earlier.
pub fn elapsed(from: DateTime<Utc>, to: DateTime<Utc>) -> Option<Duration> {
    (to - from).to_std().ok()
}
