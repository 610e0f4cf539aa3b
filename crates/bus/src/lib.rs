//! Kairos Event Bus
//!
//! Generic publish/subscribe channel decoupling event producers from
//! subscribers:
//!
//! - Handlers register against an event topic; insertion order defines
//!   delivery order.
//! - `publish` enqueues without blocking; a single dedicated worker task
//!   drains the queue and invokes handlers sequentially, in publish order
//!   across all topics.
//! - `stop` delivers everything already enqueued before returning (bounded
//!   wait), so tests never need sleeps to observe quiescence.
//! - A failing or panicking handler is logged and skipped; it cannot stall
//!   the dispatch loop or starve other subscribers.

mod bus;
mod error;
mod event;

pub use bus::EventBus;
pub use error::{BusError, BusResult};
pub use event::{BusEvent, EventHandler, HandlerError, HandlerResult};
