//! Kairos Time Sources
//!
//! [`TimeSource`] implementations for the clock engine:
//!
//! - [`SystemClock`] - real wall-clock time for production
//! - [`ManualClock`] - externally set/advanced time for deterministic tests
//!   and simulated runs
//!
//! The engine never free-runs timers against these sources; it samples them
//! once per `tock()`. That makes a [`ManualClock`] enough to replay whole
//! trading days in milliseconds.

mod manual;
mod system;

pub use manual::ManualClock;
pub use system::SystemClock;

// Re-export the TimeSource trait for convenience
pub use kairos_ports::TimeSource;
