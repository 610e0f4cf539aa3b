use chrono::{Datelike, Duration, NaiveDate, Weekday};
use kairos_ports::{CalendarError, CalendarResult, TradingCalendar};
use std::collections::HashSet;

/// Longest run of consecutive non-trading days tolerated before the
/// calendar is considered misconfigured.
const MAX_CLOSED_STREAK: i64 = 366;

/// Weekday trading calendar with an explicit holiday set
///
/// Monday through Friday trade, except dates listed as holidays. This covers
/// equity-style venues; exotic schedules belong in a host-provided adapter.
#[derive(Debug, Clone, Default)]
pub struct WeekdayCalendar {
    holidays: HashSet<NaiveDate>,
}

impl WeekdayCalendar {
    /// Calendar with no holidays
    pub fn new() -> Self {
        Self::default()
    }

    /// Calendar with the given holiday dates
    pub fn with_holidays(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }

    /// Add a holiday
    pub fn add_holiday(&mut self, date: NaiveDate) {
        self.holidays.insert(date);
    }

    fn is_weekend(date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }
}

impl TradingCalendar for WeekdayCalendar {
    fn is_trading_day(&self, date: NaiveDate) -> CalendarResult<bool> {
        Ok(!Self::is_weekend(date) && !self.holidays.contains(&date))
    }

    fn next_trading_day(&self, date: NaiveDate) -> CalendarResult<NaiveDate> {
        let mut candidate = date;
        for _ in 0..MAX_CLOSED_STREAK {
            candidate = candidate
                .checked_add_signed(Duration::days(1))
                .ok_or_else(|| CalendarError::OutOfRange(format!("no date after {candidate}")))?;
            if self.is_trading_day(candidate)? {
                return Ok(candidate);
            }
        }
        Err(CalendarError::OutOfRange(format!(
            "no trading day within {MAX_CLOSED_STREAK} days of {date}"
        )))
    }
}
