use chrono::{Duration, FixedOffset, NaiveDate, NaiveTime};
use kairos_core::{LocalTimestamp, Moment};
use kairos_ports::TradingCalendar;
use uuid::Uuid;

/// Handle identifying a registered moment alarm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MomentId(Uuid);

impl MomentId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Combine a date and time-of-day in a fixed-offset zone.
pub(crate) fn local_datetime(
    date: NaiveDate,
    time: NaiveTime,
    offset: FixedOffset,
) -> LocalTimestamp {
    use chrono::TimeZone;
    match offset.from_local_datetime(&date.and_time(time)) {
        chrono::LocalResult::Single(dt) => dt,
        // Fixed offsets have no DST folds, so the mapping is always unique
        _ => unreachable!("fixed offset maps local datetimes uniquely"),
    }
}

/// A recurring daily alarm bound to a wall-clock time-of-day
///
/// The handler tracks the next concrete trigger instant (its moment combined
/// with a target date). After an activation is processed the engine calls
/// [`advance`] to roll the trigger forward one day; a handler that is never
/// advanced stays perpetually active.
///
/// Sampling gaps: when the engine was not sampled across one or more whole
/// trigger boundaries (the sampled "now" lands on a later calendar day than
/// the trigger), the makeup flag decides whether the handler fires one
/// catch-up alarm or silently skips to the next future boundary. A same-day
/// late activation is a normal fire - a discrete sampler always observes the
/// trigger slightly late.
///
/// [`advance`]: MomentHandler::advance
#[derive(Debug, Clone)]
pub struct MomentHandler {
    id: MomentId,
    name: String,
    moment: Moment,
    next_trigger: LocalTimestamp,
    makeup: bool,
    trading_day_only: bool,
}

impl MomentHandler {
    /// Create a handler whose first trigger is computed from the engine's
    /// current time.
    ///
    /// With `makeup == false` the next trigger is the earliest instant at or
    /// after `now` whose time-of-day equals the moment; with `makeup == true`
    /// a trigger earlier today is kept, so the missed alarm fires on the
    /// first sample. Trading-day-only handlers created on a non-trading day
    /// start on the next trading day in either mode.
    pub(crate) fn new(
        name: impl Into<String>,
        moment: Moment,
        makeup: bool,
        trading_day_only: bool,
        now: LocalTimestamp,
        calendar: &dyn TradingCalendar,
    ) -> Self {
        let today = now.date_naive();
        let mut handler = Self {
            id: MomentId::new(),
            name: name.into(),
            moment,
            next_trigger: local_datetime(today, moment, *now.offset()),
            makeup,
            trading_day_only,
        };

        if trading_day_only {
            let trading_today = match calendar.is_trading_day(today) {
                Ok(trading) => trading,
                Err(err) => {
                    log::warn!("Calendar lookup failed for {today}: {err}; assuming trading day");
                    true
                }
            };
            if !trading_today {
                handler.advance(calendar);
            }
        }
        if !handler.makeup && handler.next_trigger < now {
            handler.advance_past(now, calendar);
        }

        handler
    }

    pub fn id(&self) -> MomentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn moment(&self) -> Moment {
        self.moment
    }

    pub fn makeup(&self) -> bool {
        self.makeup
    }

    /// Whether this alarm only activates on trading days
    pub fn trading_day_only(&self) -> bool {
        self.trading_day_only
    }

    /// The next concrete instant this alarm triggers at
    pub fn next_trigger(&self) -> LocalTimestamp {
        self.next_trigger
    }

    /// True iff the trigger instant has been reached.
    ///
    /// `trading_day` is today's calendar answer, computed once per sample by
    /// the engine; it only gates trading-day-only alarms.
    pub fn is_active(&self, now: LocalTimestamp, trading_day: bool) -> bool {
        if self.trading_day_only && !trading_day {
            return false;
        }
        now >= self.next_trigger
    }

    /// True iff the activation crossed at least one whole day boundary,
    /// i.e. the trigger was missed rather than observed slightly late.
    pub fn missed(&self, now: LocalTimestamp) -> bool {
        now.date_naive() > self.next_trigger.date_naive()
    }

    /// Roll the trigger forward one day (same time-of-day). Trading-day-only
    /// alarms step to the next trading date; if the calendar fails the step
    /// falls back to the next calendar day, and `advance_past` re-steps once
    /// the calendar recovers.
    pub fn advance(&mut self, calendar: &dyn TradingCalendar) {
        let current_date = self.next_trigger.date_naive();
        let next_date = if self.trading_day_only {
            match calendar.next_trading_day(current_date) {
                Ok(date) => date,
                Err(err) => {
                    log::warn!(
                        "Calendar lookup failed after {current_date}: {err}; \
                         stepping one calendar day"
                    );
                    current_date + Duration::days(1)
                }
            }
        } else {
            current_date + Duration::days(1)
        };
        self.next_trigger = local_datetime(next_date, self.moment, *self.next_trigger.offset());
    }

    /// Advance repeatedly until the trigger is strictly in the future,
    /// firing nothing. Used to resolve multi-day sampling gaps.
    pub fn advance_past(&mut self, now: LocalTimestamp, calendar: &dyn TradingCalendar) {
        while self.next_trigger <= now {
            self.advance(calendar);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use kairos_calendar::{AlwaysOpenCalendar, WeekdayCalendar};

    fn tz() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> LocalTimestamp {
        tz().with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn moment(h: u32, mi: u32, s: u32) -> Moment {
        NaiveTime::from_hms_opt(h, mi, s).unwrap()
    }

    #[test]
    fn test_activates_exactly_at_its_moment() {
        let calendar = AlwaysOpenCalendar::new();
        let now = at(2016, 7, 14, 23, 59, 58);
        let handler = MomentHandler::new("test", moment(23, 59, 59), false, false, now, &calendar);

        assert!(!handler.is_active(now, true));
        assert!(handler.is_active(at(2016, 7, 14, 23, 59, 59), true));
    }

    #[test]
    fn test_advance_deactivates_until_the_next_day() {
        let calendar = AlwaysOpenCalendar::new();
        let now = at(2016, 7, 14, 23, 59, 58);
        let mut handler =
            MomentHandler::new("test", moment(23, 59, 59), false, false, now, &calendar);

        let trigger = at(2016, 7, 14, 23, 59, 59);
        assert!(handler.is_active(trigger, true));

        handler.advance(&calendar);
        assert!(!handler.is_active(trigger, true));
        assert_eq!(handler.next_trigger(), at(2016, 7, 15, 23, 59, 59));
    }

    #[test]
    fn test_without_makeup_a_passed_moment_starts_tomorrow() {
        let calendar = AlwaysOpenCalendar::new();
        let now = at(2016, 7, 14, 23, 59, 59);
        let handler = MomentHandler::new("test", moment(0, 0, 0), false, false, now, &calendar);

        assert_eq!(handler.next_trigger(), at(2016, 7, 15, 0, 0, 0));
        assert!(!handler.is_active(now, true));
    }

    #[test]
    fn test_with_makeup_a_passed_moment_stays_due() {
        let calendar = AlwaysOpenCalendar::new();
        let now = at(2016, 7, 14, 23, 59, 59);
        let handler = MomentHandler::new("test", moment(0, 0, 0), true, false, now, &calendar);

        assert_eq!(handler.next_trigger(), at(2016, 7, 14, 0, 0, 0));
        assert!(handler.is_active(now, true));
        // Same calendar day: a late observation, not a missed boundary
        assert!(!handler.missed(now));
    }

    #[test]
    fn test_advance_past_lands_on_the_smallest_future_trigger() {
        let calendar = AlwaysOpenCalendar::new();
        let created = at(2024, 3, 1, 8, 0, 0);
        let mut handler = MomentHandler::new("test", moment(9, 30, 0), false, false, created, &calendar);

        // Five days of missed samples
        let now = at(2024, 3, 6, 10, 0, 0);
        assert!(handler.missed(now));
        handler.advance_past(now, &calendar);

        assert_eq!(handler.next_trigger(), at(2024, 3, 7, 9, 30, 0));
        assert!(!handler.is_active(now, true));
    }

    #[test]
    fn test_trading_day_only_steps_over_the_weekend() {
        let calendar = WeekdayCalendar::new();
        // Friday morning
        let now = at(2024, 3, 1, 8, 0, 0);
        let mut handler = MomentHandler::new("open", moment(9, 0, 0), false, true, now, &calendar);

        assert_eq!(handler.next_trigger(), at(2024, 3, 1, 9, 0, 0));
        handler.advance(&calendar);
        // Saturday and Sunday skipped
        assert_eq!(handler.next_trigger(), at(2024, 3, 4, 9, 0, 0));
    }

    #[test]
    fn test_trading_day_only_created_on_weekend_starts_monday() {
        let calendar = WeekdayCalendar::new();
        // Saturday, before the moment
        let now = at(2024, 3, 2, 8, 0, 0);
        let handler = MomentHandler::new("open", moment(9, 0, 0), true, true, now, &calendar);

        assert_eq!(handler.next_trigger(), at(2024, 3, 4, 9, 0, 0));
        // Saturday is gated off regardless of the trigger
        assert!(!handler.is_active(at(2024, 3, 2, 10, 0, 0), false));
    }

}
