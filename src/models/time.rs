//! Time dimension record

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A row of the `time` dimension, decomposed from one play timestamp
///
/// `start_time` is the wall-clock instant in the offset the timestamp was
/// recorded with; the calendar fields agree with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRecord {
    pub start_time: NaiveDateTime,
    pub hour: u32,
    pub day: u32,
    /// ISO 8601 week number
    pub week_of_year: u32,
    pub month: u32,
    pub year: i32,
    /// Full English day name, e.g. `Friday`
    pub weekday_name: String,
}
