//! Kairos Core Domain
//!
//! Pure domain types for the Kairos clock/event subsystem.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod events;
pub mod session;
pub mod values;

// Re-export commonly used types at crate root
pub use events::{ClockEvent, ClockLabel, EventTopic};
pub use session::{SessionSchedule, SessionState};
pub use values::{LocalTimestamp, Moment, Timestamp, epoch_seconds};
