use crate::values::Moment;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Market session phase.
///
/// Mutated only by the clock engine during sampling; read by interval
/// handlers for trading-state gating and exposed read-only to hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// Trading day, before the open boundary
    PreOpen,
    /// Continuous trading
    Open,
    /// Midday pause
    Paused,
    /// After close, or a non-trading day
    Closed,
}

impl SessionState {
    /// The boolean trading flag derived from the phase.
    ///
    /// The midday pause keeps the trading flag raised: only the close
    /// boundary (or a non-trading day) lowers it.
    pub fn is_trading(&self) -> bool {
        matches!(self, SessionState::Open | SessionState::Paused)
    }
}

/// Times of day at which the session boundaries trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSchedule {
    /// Session start
    pub open: Moment,
    /// Midday pause
    pub pause: Moment,
    /// Midday resume
    pub resume: Moment,
    /// Session end
    pub close: Moment,
}

impl SessionSchedule {
    /// Returns true if the boundaries are strictly ordered within the day
    pub fn is_ordered(&self) -> bool {
        self.open < self.pause && self.pause < self.resume && self.resume < self.close
    }

    /// The phase a trading day is in at time-of-day `t`.
    ///
    /// Used to derive the initial session state for engines constructed
    /// mid-session; thereafter the state is driven by boundary events.
    pub fn phase_at(&self, t: NaiveTime) -> SessionState {
        if t < self.open {
            SessionState::PreOpen
        } else if t < self.pause {
            SessionState::Open
        } else if t < self.resume {
            SessionState::Paused
        } else if t < self.close {
            SessionState::Open
        } else {
            SessionState::Closed
        }
    }
}

impl Default for SessionSchedule {
    /// A-share mainland session: 09:00 open, 11:30 pause, 13:00 resume,
    /// 15:00 close.
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            pause: NaiveTime::from_hms_opt(11, 30, 0).unwrap(),
            resume: NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
            close: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
        }
    }
}
