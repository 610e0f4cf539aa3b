use chrono::{Duration, Utc};
use kairos_core::Timestamp;
use kairos_ports::TimeSource;
use std::sync::{Arc, RwLock};

/// Manually driven clock for deterministic tests and simulation
///
/// Holds a fixed instant that only moves when the driver calls [`set`] or
/// [`advance`]. Cloning is cheap and shares the same instant, so a test can
/// keep one handle while the engine owns another.
///
/// Nothing prevents setting the time backwards: the engine contract only
/// requires that it reads the latest value at sampling time.
///
/// [`set`]: ManualClock::set
/// [`advance`]: ManualClock::advance
#[derive(Clone)]
pub struct ManualClock {
    current: Arc<RwLock<Timestamp>>,
}

impl ManualClock {
    /// Create a clock frozen at `initial`
    pub fn new(initial: Timestamp) -> Self {
        Self {
            current: Arc::new(RwLock::new(initial)),
        }
    }

    /// Create a clock frozen at the current wall-clock time
    pub fn from_system_now() -> Self {
        Self::new(Utc::now())
    }

    /// Explicitly set the current time
    pub fn set(&self, time: Timestamp) {
        let mut current = self.current.write().expect("manual clock lock poisoned");
        *current = time;
    }

    /// Move the current time forward (or backward, with a negative duration)
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.write().expect("manual clock lock poisoned");
        *current += duration;
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current.read().expect("manual clock lock poisoned")
    }

    fn name(&self) -> &str {
        "ManualClock"
    }
}
