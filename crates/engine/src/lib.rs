//! Kairos Clock Engine
//!
//! The discrete-time scheduler at the heart of the subsystem. The engine
//! owns the registered alarms and the market-session state machine; its
//! single entry point [`ClockEngine::tock`] samples the injected time
//! source, evaluates every alarm against that one consistent instant, and
//! publishes resulting [`ClockEvent`]s onto the event bus.
//!
//! Alarm kinds:
//!
//! - [`MomentHandler`] - a time-of-day alarm firing once per calendar day,
//!   with a configurable makeup policy for sampling gaps
//! - [`IntervalHandler`] - a periodic alarm gated on trading state, firing
//!   at most once per sample however many boundaries a gap skipped
//!
//! The engine is deliberately synchronous and single-driver: `tock()` takes
//! `&mut self`, so ownership serializes sampling and "now" is never
//! ambiguous. Only the bus delivers asynchronously.
//!
//! [`ClockEvent`]: kairos_core::ClockEvent

mod engine;
mod error;
mod interval;
mod moment;

pub use engine::ClockEngine;
pub use error::{EngineError, Result};
pub use interval::{IntervalHandler, IntervalId};
pub use moment::{MomentHandler, MomentId};
