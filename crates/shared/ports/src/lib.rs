//! Kairos Ports
//!
//! Port definitions (traits) for the Kairos clock/event subsystem.
//! These define the boundaries between the engine and infrastructure.

mod calendar;
mod error;
mod time;

pub use calendar::TradingCalendar;
pub use error::{CalendarError, CalendarResult};
pub use time::TimeSource;
