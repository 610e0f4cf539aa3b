use chrono::Duration;
use kairos_core::LocalTimestamp;
use uuid::Uuid;

/// Handle identifying a registered interval alarm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntervalId(Uuid);

impl IntervalId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// A periodic alarm firing every fixed duration, gated on trading state
///
/// Boundaries are counted from a fixed reference instant (registration
/// time): the handler fires whenever the number of whole durations elapsed
/// exceeds the count at its last fire. A sampling gap that skips several
/// boundaries therefore coalesces to a single fire - periodic alarms never
/// catch up, unlike moment alarms with makeup.
#[derive(Debug, Clone)]
pub struct IntervalHandler {
    id: IntervalId,
    duration: Duration,
    trading: bool,
    tag: String,
    reference: LocalTimestamp,
    last_fired_index: i64,
}

impl IntervalHandler {
    /// `duration` must be positive (validated by the engine at registration)
    pub(crate) fn new(
        duration: Duration,
        trading: bool,
        tag: impl Into<String>,
        reference: LocalTimestamp,
    ) -> Self {
        Self {
            id: IntervalId::new(),
            duration,
            trading,
            tag: tag.into(),
            reference,
            last_fired_index: 0,
        }
    }

    pub fn id(&self) -> IntervalId {
        self.id
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// The session trading state this alarm requires to fire
    pub fn trading(&self) -> bool {
        self.trading
    }

    /// Event label this alarm publishes under
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The instant interval boundaries are measured from
    pub fn reference(&self) -> LocalTimestamp {
        self.reference
    }

    /// Decide whether the alarm fires at `now`, and if so consume the
    /// boundary crossing.
    ///
    /// Fires iff the current trading state matches the required one and at
    /// least one new duration boundary has been crossed since the last fire;
    /// the boundary index then jumps straight to the present, so skipped
    /// boundaries are never fired retroactively.
    pub fn should_fire(&mut self, now: LocalTimestamp, trading_state: bool) -> bool {
        if self.trading != trading_state {
            return false;
        }
        let elapsed_ms = (now - self.reference).num_milliseconds();
        if elapsed_ms < 0 {
            return false;
        }
        let index = elapsed_ms / self.duration.num_milliseconds();
        if index > self.last_fired_index {
            self.last_fired_index = index;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn reference() -> LocalTimestamp {
        FixedOffset::east_opt(8 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 1, 9, 15, 0)
            .unwrap()
    }

    #[test]
    fn test_fires_floor_n_over_d_times_at_one_hertz() {
        let start = reference();
        let mut handler = IntervalHandler::new(Duration::seconds(7), true, "7s", start);

        let mut fires = 0;
        for sec in 1..=60 {
            if handler.should_fire(start + Duration::seconds(sec), true) {
                fires += 1;
            }
        }
        assert_eq!(fires, 60 / 7);
    }

    #[test]
    fn test_fractional_minute_duration_fires_on_the_boundary() {
        let start = reference();
        // 2.5 minutes
        let mut handler = IntervalHandler::new(Duration::seconds(150), true, "150s", start);

        for sec in 1..150 {
            assert!(!handler.should_fire(start + Duration::seconds(sec), true));
        }
        assert!(handler.should_fire(start + Duration::seconds(150), true));
        assert!(!handler.should_fire(start + Duration::seconds(151), true));
    }

    #[test]
    fn test_mismatched_trading_state_never_fires() {
        let start = reference();
        let mut handler = IntervalHandler::new(Duration::seconds(10), true, "10s", start);

        for sec in 1..=60 {
            assert!(!handler.should_fire(start + Duration::seconds(sec), false));
        }
    }

    #[test]
    fn test_gap_over_many_boundaries_coalesces_to_one_fire() {
        let start = reference();
        let mut handler = IntervalHandler::new(Duration::seconds(10), true, "10s", start);

        assert!(handler.should_fire(start + Duration::seconds(10), true));

        // Ten boundaries skipped in one sampling gap
        assert!(handler.should_fire(start + Duration::seconds(110), true));
        assert!(!handler.should_fire(start + Duration::seconds(111), true));
        assert!(handler.should_fire(start + Duration::seconds(120), true));
    }

    #[test]
    fn test_boundaries_crossed_while_gated_are_not_replayed() {
        let start = reference();
        let mut handler = IntervalHandler::new(Duration::seconds(10), true, "10s", start);

        // Session closed across three boundaries
        for sec in 1..=30 {
            assert!(!handler.should_fire(start + Duration::seconds(sec), false));
        }

        // Reopening fires once for the backlog, then resumes cadence
        assert!(handler.should_fire(start + Duration::seconds(31), true));
        assert!(!handler.should_fire(start + Duration::seconds(32), true));
        assert!(handler.should_fire(start + Duration::seconds(40), true));
    }

    #[test]
    fn test_time_before_the_reference_never_fires() {
        let start = reference();
        let mut handler = IntervalHandler::new(Duration::seconds(10), true, "10s", start);

        assert!(!handler.should_fire(start - Duration::seconds(30), true));
    }
}
