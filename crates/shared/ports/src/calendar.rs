use crate::error::CalendarResult;
use chrono::NaiveDate;

/// Port for the external trading-calendar provider
///
/// Answers "is this date a trading day". The engine treats the adapter as
/// authoritative and synchronous; it may be queried once per sample, so
/// implementations should be cheap and idempotent. A failing adapter is
/// treated by the engine as "not a trading day" for that sample (fail-safe
/// closed).
pub trait TradingCalendar: Send + Sync {
    /// Whether the market is scheduled to operate on `date`
    fn is_trading_day(&self, date: NaiveDate) -> CalendarResult<bool>;

    /// The first trading day strictly after `date`
    fn next_trading_day(&self, date: NaiveDate) -> CalendarResult<NaiveDate>;
}
