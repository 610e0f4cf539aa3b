use crate::error::{EngineError, Result};
use crate::interval::{IntervalHandler, IntervalId};
use crate::moment::{MomentHandler, MomentId};
use chrono::{Duration, FixedOffset, NaiveDate};
use kairos_bus::EventBus;
use kairos_core::{
    ClockEvent, ClockLabel, LocalTimestamp, Moment, SessionSchedule, SessionState, epoch_seconds,
};
use kairos_ports::{TimeSource, TradingCalendar};
use std::sync::Arc;

/// The four fixed session boundaries, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionBoundary {
    Open,
    Pause,
    Resume,
    Close,
}

impl SessionBoundary {
    const ALL: [SessionBoundary; 4] = [
        SessionBoundary::Open,
        SessionBoundary::Pause,
        SessionBoundary::Resume,
        SessionBoundary::Close,
    ];

    fn label(self) -> ClockLabel {
        match self {
            SessionBoundary::Open => ClockLabel::Open,
            SessionBoundary::Pause => ClockLabel::Pause,
            SessionBoundary::Resume => ClockLabel::Continue,
            SessionBoundary::Close => ClockLabel::Close,
        }
    }

    /// The session phase entered when this boundary fires
    fn state(self) -> SessionState {
        match self {
            SessionBoundary::Open => SessionState::Open,
            SessionBoundary::Pause => SessionState::Paused,
            SessionBoundary::Resume => SessionState::Open,
            SessionBoundary::Close => SessionState::Closed,
        }
    }

    fn moment(self, schedule: &SessionSchedule) -> Moment {
        match self {
            SessionBoundary::Open => schedule.open,
            SessionBoundary::Pause => schedule.pause,
            SessionBoundary::Resume => schedule.resume,
            SessionBoundary::Close => schedule.close,
        }
    }
}

/// The discrete-time clock engine
///
/// Owns the registered alarms and the session state machine. The host calls
/// [`tock`](ClockEngine::tock) from its real-time loop (sub-second cadence in
/// production, arbitrary cadence under a [`ManualClock`]); each call samples
/// the time source exactly once so every alarm observes a single consistent
/// instant, then publishes any resulting events onto the bus.
///
/// `tock()` takes `&mut self`: ownership serializes sampling, so the engine
/// needs no internal locking and "now" is never ambiguous. External readers
/// of the session state get eventually-consistent values between samples.
///
/// [`ManualClock`]: https://docs.rs/kairos-clock
pub struct ClockEngine {
    bus: EventBus<ClockEvent>,
    time_source: Arc<dyn TimeSource>,
    calendar: Arc<dyn TradingCalendar>,
    tz: FixedOffset,
    schedule: SessionSchedule,
    /// Epoch seconds of the last sample
    now: f64,
    /// The same instant in the market timezone
    now_dt: LocalTimestamp,
    current_date: NaiveDate,
    session: SessionState,
    session_moments: Vec<(SessionBoundary, MomentHandler)>,
    moment_handlers: Vec<MomentHandler>,
    interval_handlers: Vec<IntervalHandler>,
}

impl ClockEngine {
    /// Durations of the interval alarms every engine starts with: 30
    /// seconds, then 1, 5, 15, 30 and 60 minutes, all requiring the trading
    /// state and published under their duration tags (`"30s"` .. `"3600s"`).
    pub const DEFAULT_INTERVAL_SECONDS: [i64; 6] = [30, 60, 300, 900, 1800, 3600];

    /// Engine with the default session schedule
    pub fn new(
        bus: EventBus<ClockEvent>,
        time_source: Arc<dyn TimeSource>,
        tz: FixedOffset,
        calendar: Arc<dyn TradingCalendar>,
    ) -> Result<Self> {
        Self::with_schedule(bus, time_source, tz, calendar, SessionSchedule::default())
    }

    /// Engine with a custom session schedule
    ///
    /// Samples the time source once to seed `now`, derives the initial
    /// session phase from where that instant falls in the schedule (so an
    /// engine constructed mid-session starts in the right state), installs
    /// the four session-boundary alarms as trading-day-only moments, and
    /// registers the [`DEFAULT_INTERVAL_SECONDS`] alarm set.
    ///
    /// [`DEFAULT_INTERVAL_SECONDS`]: ClockEngine::DEFAULT_INTERVAL_SECONDS
    pub fn with_schedule(
        bus: EventBus<ClockEvent>,
        time_source: Arc<dyn TimeSource>,
        tz: FixedOffset,
        calendar: Arc<dyn TradingCalendar>,
        schedule: SessionSchedule,
    ) -> Result<Self> {
        if !schedule.is_ordered() {
            return Err(EngineError::UnorderedSchedule);
        }

        let sampled = time_source.now();
        let now_dt = sampled.with_timezone(&tz);
        let today = now_dt.date_naive();
        let trading_day = query_trading_day(calendar.as_ref(), today);
        let session = if trading_day {
            schedule.phase_at(now_dt.time())
        } else {
            SessionState::Closed
        };

        let session_moments = SessionBoundary::ALL
            .iter()
            .map(|&boundary| {
                let handler = MomentHandler::new(
                    boundary.label().as_str(),
                    boundary.moment(&schedule),
                    false,
                    true,
                    now_dt,
                    calendar.as_ref(),
                );
                (boundary, handler)
            })
            .collect();

        log::info!(
            "Clock engine started at {now_dt} ({}), session {session:?}",
            time_source.name()
        );

        let mut engine = Self {
            bus,
            time_source,
            calendar,
            tz,
            schedule,
            now: epoch_seconds(&sampled),
            now_dt,
            current_date: today,
            session,
            session_moments,
            moment_handlers: Vec::new(),
            interval_handlers: Vec::new(),
        };

        for &secs in &Self::DEFAULT_INTERVAL_SECONDS {
            engine.register_interval(Duration::seconds(secs), true)?;
        }

        Ok(engine)
    }

    /// Epoch seconds of the last sample (sub-second precision)
    pub fn now(&self) -> f64 {
        self.now
    }

    /// The last sampled instant in the market timezone
    pub fn now_dt(&self) -> LocalTimestamp {
        self.now_dt
    }

    pub fn timezone(&self) -> FixedOffset {
        self.tz
    }

    pub fn schedule(&self) -> &SessionSchedule {
        &self.schedule
    }

    /// Current market session phase (read-only; mutated only by `tock`)
    pub fn session_state(&self) -> SessionState {
        self.session
    }

    /// The boolean trading flag derived from the session phase
    pub fn trading_state(&self) -> bool {
        self.session.is_trading()
    }

    /// Registered interval alarms, for introspection and tests
    pub fn interval_handlers(&self) -> &[IntervalHandler] {
        &self.interval_handlers
    }

    /// Registered custom moment alarms, for introspection and tests
    pub fn moment_handlers(&self) -> &[MomentHandler] {
        &self.moment_handlers
    }

    /// Another handle onto the bus this engine publishes to
    pub fn bus(&self) -> &EventBus<ClockEvent> {
        &self.bus
    }

    /// Register a daily moment alarm published as `ClockLabel::Custom(name)`
    ///
    /// `makeup` controls catch-up firing after sampling gaps (see
    /// [`MomentHandler`]). The first trigger is computed from the engine's
    /// current time.
    pub fn register_moment(&mut self, name: &str, moment: Moment, makeup: bool) -> Result<MomentId> {
        self.add_moment(name, moment, makeup, false)
    }

    /// Like [`register_moment`](ClockEngine::register_moment), but the alarm
    /// only activates on trading days and advances to the next trading date.
    pub fn register_trading_moment(
        &mut self,
        name: &str,
        moment: Moment,
        makeup: bool,
    ) -> Result<MomentId> {
        self.add_moment(name, moment, makeup, true)
    }

    /// Register a periodic alarm labeled with a default tag derived from the
    /// duration (e.g. `"150s"`).
    ///
    /// `trading` is the session trading state required for the alarm to
    /// fire. Boundaries are measured from the engine's current time.
    pub fn register_interval(&mut self, duration: Duration, trading: bool) -> Result<IntervalId> {
        let tag = default_interval_tag(duration);
        self.add_interval(duration, trading, tag)
    }

    /// Register a periodic alarm published under a custom tag
    pub fn register_interval_with_tag(
        &mut self,
        duration: Duration,
        trading: bool,
        tag: &str,
    ) -> Result<IntervalId> {
        self.add_interval(duration, trading, tag.to_string())
    }

    /// The single state-transition entry point
    ///
    /// Samples the time source, updates the cached instant and session
    /// state, evaluates every alarm, and publishes resulting events in a
    /// fixed order: session boundaries first, then custom moments, then
    /// intervals. Never fails: calendar outages and publish errors are
    /// logged and absorbed, and the next call simply re-evaluates at the new
    /// instant.
    pub fn tock(&mut self) {
        let sampled = self.time_source.now();
        self.now = epoch_seconds(&sampled);
        self.now_dt = sampled.with_timezone(&self.tz);

        let now_dt = self.now_dt;
        let today = now_dt.date_naive();
        let trading_day = query_trading_day(self.calendar.as_ref(), today);

        // Day rollover re-derives the phase from the schedule, so a sample
        // resuming mid-session after a gap does not sit in PreOpen while
        // stale boundary alarms are skipped forward.
        if today != self.current_date {
            self.current_date = today;
            self.session = if trading_day {
                self.schedule.phase_at(now_dt.time())
            } else {
                SessionState::Closed
            };
        }

        if trading_day {
            for index in 0..self.session_moments.len() {
                let (boundary, handler) = {
                    let entry = &mut self.session_moments[index];
                    (entry.0, &mut entry.1)
                };
                if !handler.is_active(now_dt, trading_day) {
                    continue;
                }
                if handler.missed(now_dt) {
                    // Boundaries from earlier days are stale; skip forward
                    handler.advance_past(now_dt, self.calendar.as_ref());
                    continue;
                }
                self.session = boundary.state();
                publish(&self.bus, boundary.label(), now_dt);
                handler.advance(self.calendar.as_ref());
            }
        } else if self.session != SessionState::Closed {
            self.session = SessionState::Closed;
        }

        for handler in self.moment_handlers.iter_mut() {
            if !handler.is_active(now_dt, trading_day) {
                continue;
            }
            if handler.missed(now_dt) {
                if handler.makeup() {
                    // One catch-up fire regardless of how many days were skipped
                    publish(&self.bus, ClockLabel::custom(handler.name()), now_dt);
                }
                handler.advance_past(now_dt, self.calendar.as_ref());
            } else {
                publish(&self.bus, ClockLabel::custom(handler.name()), now_dt);
                handler.advance(self.calendar.as_ref());
            }
        }

        let trading_state = self.session.is_trading();
        for handler in self.interval_handlers.iter_mut() {
            if handler.should_fire(now_dt, trading_state) {
                publish(&self.bus, ClockLabel::custom(handler.tag()), now_dt);
            }
        }
    }

    fn add_moment(
        &mut self,
        name: &str,
        moment: Moment,
        makeup: bool,
        trading_day_only: bool,
    ) -> Result<MomentId> {
        self.validate_label(name)?;
        let handler = MomentHandler::new(
            name,
            moment,
            makeup,
            trading_day_only,
            self.now_dt,
            self.calendar.as_ref(),
        );
        let id = handler.id();
        log::debug!("Registered moment alarm '{name}' next firing {}", handler.next_trigger());
        self.moment_handlers.push(handler);
        Ok(id)
    }

    fn add_interval(&mut self, duration: Duration, trading: bool, tag: String) -> Result<IntervalId> {
        let millis = duration.num_milliseconds();
        if millis <= 0 {
            return Err(EngineError::NonPositiveInterval(millis));
        }
        self.validate_label(&tag)?;
        let handler = IntervalHandler::new(duration, trading, tag, self.now_dt);
        let id = handler.id();
        self.interval_handlers.push(handler);
        Ok(id)
    }

    fn validate_label(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(EngineError::EmptyName);
        }
        if ClockLabel::is_reserved(name) {
            return Err(EngineError::ReservedLabel(name.to_string()));
        }
        let taken = self.moment_handlers.iter().any(|h| h.name() == name)
            || self.interval_handlers.iter().any(|h| h.tag() == name);
        if taken {
            return Err(EngineError::DuplicateName(name.to_string()));
        }
        Ok(())
    }
}

/// Publish one clock event; a closed bus costs the event, never the sample.
fn publish(bus: &EventBus<ClockEvent>, label: ClockLabel, fired_at: LocalTimestamp) {
    if let Err(err) = bus.publish(ClockEvent::new(label.clone(), fired_at)) {
        log::warn!("Dropping clock event '{label}': {err}");
    }
}

fn query_trading_day(calendar: &dyn TradingCalendar, date: NaiveDate) -> bool {
    match calendar.is_trading_day(date) {
        Ok(trading) => trading,
        Err(err) => {
            // Fail-safe closed: an unreachable calendar means no trading
            log::warn!("Calendar adapter failed for {date}: {err}; treating as non-trading day");
            false
        }
    }
}

fn default_interval_tag(duration: Duration) -> String {
    let millis = duration.num_milliseconds();
    if millis % 1000 == 0 {
        format!("{}s", millis / 1000)
    } else {
        format!("{millis}ms")
    }
}
