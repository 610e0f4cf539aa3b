use chrono::{DateTime, FixedOffset, NaiveTime, Utc};

/// Timestamp in UTC - what time sources produce
pub type Timestamp = DateTime<Utc>;

/// Timestamp in the engine's local market timezone
pub type LocalTimestamp = DateTime<FixedOffset>;

/// A time-of-day alarm trigger, repeating once per calendar day.
/// Interpreted in the engine's timezone; carries no date component.
pub type Moment = NaiveTime;

/// Numeric epoch representation of a timestamp: seconds since the UNIX
/// epoch with sub-second precision.
pub fn epoch_seconds<Tz: chrono::TimeZone>(ts: &DateTime<Tz>) -> f64 {
    ts.timestamp_micros() as f64 / 1_000_000.0
}
