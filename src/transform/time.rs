//! Calendar decomposition of play timestamps

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use thiserror::Error;

use crate::models::TimeRecord;

/// Epoch milliseconds outside the representable range
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{0} ms is out of range for a timestamp")]
pub struct TimestampOutOfRange(pub i64);

/// Convert the logs' epoch milliseconds to a UTC instant
pub fn timestamp_from_millis(millis: i64) -> Result<DateTime<Utc>, TimestampOutOfRange> {
    DateTime::<Utc>::from_timestamp_millis(millis).ok_or(TimestampOutOfRange(millis))
}

/// Decompose a timestamp into the `time` dimension columns
///
/// Fields are read in the timestamp's own offset; no conversion happens.
pub fn derive_time_fields<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> TimeRecord {
    let local = timestamp.naive_local();
    TimeRecord {
        start_time: local,
        hour: local.hour(),
        day: local.day(),
        week_of_year: local.iso_week().week(),
        month: local.month(),
        year: local.year(),
        weekday_name: local.format("%A").to_string(),
    }
}
