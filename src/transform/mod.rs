//! Per-event derivations: calendar fields and catalogue lookups

mod resolve;
mod time;

pub use resolve::LookupResolver;
pub use time::{TimestampOutOfRange, derive_time_fields, timestamp_from_millis};
