use chrono::{Duration, NaiveDate};
use kairos_ports::{CalendarError, CalendarResult, TradingCalendar};

/// Calendar for venues that never close (e.g. crypto)
///
/// Every date is a trading day.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOpenCalendar;

impl AlwaysOpenCalendar {
    pub fn new() -> Self {
        Self
    }
}

impl TradingCalendar for AlwaysOpenCalendar {
    fn is_trading_day(&self, _date: NaiveDate) -> CalendarResult<bool> {
        Ok(true)
    }

    fn next_trading_day(&self, date: NaiveDate) -> CalendarResult<NaiveDate> {
        date.checked_add_signed(Duration::days(1))
            .ok_or_else(|| CalendarError::OutOfRange(format!("no date after {date}")))
    }
}
