use chrono::Utc;
use kairos_core::Timestamp;
use kairos_ports::TimeSource;

/// Wall-clock time source backed by the operating system
///
/// Reads `Utc::now()` on every sample. The OS clock may step backwards
/// under NTP adjustment; the [`TimeSource`] contract tolerates that, since
/// the engine only reads the latest value once per sampling call and never
/// free-runs timers against it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl TimeSource for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }

    fn name(&self) -> &str {
        "SystemClock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::thread;

    #[test]
    fn test_samples_track_wall_time() {
        let clock = SystemClock::new();

        let first = clock.now();
        thread::sleep(std::time::Duration::from_millis(10));
        let second = clock.now();

        assert!(second - first >= Duration::milliseconds(9));
        assert_eq!(clock.name(), "SystemClock");
    }
}
