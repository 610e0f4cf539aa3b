//! Kairos Trading Calendars
//!
//! [`TradingCalendar`] implementations:
//!
//! - [`AlwaysOpenCalendar`] - every day trades (24/7 venues, and tests that
//!   do not need session awareness)
//! - [`WeekdayCalendar`] - Monday to Friday, minus an explicit holiday set
//!
//! Deterministic, pure logic: no IO, no wall-clock, no randomness.

mod always_open;
mod weekday;

pub use always_open::AlwaysOpenCalendar;
pub use weekday::WeekdayCalendar;

// Re-export the TradingCalendar trait for convenience
pub use kairos_ports::TradingCalendar;
