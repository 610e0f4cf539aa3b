use kairos_core::{ClockEvent, EventTopic};
use std::hash::Hash;
use std::sync::Arc;

/// A message that can travel on the event bus
///
/// Events are routed by topic: handlers register per topic and receive every
/// event whose [`topic`](BusEvent::topic) matches.
pub trait BusEvent: Clone + Send + 'static {
    /// Routing key for handler registration
    type Topic: Clone + Eq + Hash + Send + Sync + 'static;

    fn topic(&self) -> Self::Topic;
}

/// Clock events are all published under [`EventTopic::Clock`]; subscribers
/// discriminate on the event label.
impl BusEvent for ClockEvent {
    type Topic = EventTopic;

    fn topic(&self) -> EventTopic {
        EventTopic::Clock
    }
}

/// Error a subscriber handler may return; logged by the dispatch loop
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

pub type HandlerResult = std::result::Result<(), HandlerError>;

/// A registered subscriber callback
pub type EventHandler<E> = Arc<dyn Fn(&E) -> HandlerResult + Send + Sync>;
