use crate::values::LocalTimestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies which clock alarm produced an event.
///
/// The four session labels are reserved by the engine. Every other alarm is
/// published under the name (moments) or tag (intervals) it was registered
/// with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClockLabel {
    /// Session start
    Open,
    /// Midday pause
    Pause,
    /// Midday resume
    Continue,
    /// Session end
    Close,
    /// A registered moment or interval alarm
    Custom(String),
}

impl ClockLabel {
    /// Label names reserved for session boundaries
    pub const RESERVED: [&'static str; 4] = ["open", "pause", "continue", "close"];

    /// Build a custom label from a registered alarm name or tag
    pub fn custom(name: impl Into<String>) -> Self {
        ClockLabel::Custom(name.into())
    }

    /// Returns true if `name` collides with a reserved session label
    pub fn is_reserved(name: &str) -> bool {
        Self::RESERVED.contains(&name)
    }

    /// The wire/display form of the label
    pub fn as_str(&self) -> &str {
        match self {
            ClockLabel::Open => "open",
            ClockLabel::Pause => "pause",
            ClockLabel::Continue => "continue",
            ClockLabel::Close => "close",
            ClockLabel::Custom(name) => name,
        }
    }
}

impl fmt::Display for ClockLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Topic a bus event is published under.
///
/// The clock engine publishes everything on [`EventTopic::Clock`];
/// subscribers discriminate on the event's [`ClockLabel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    Clock,
}

/// An immutable record of a clock alarm firing.
///
/// Events are transient: published onto the bus, delivered to subscribers,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockEvent {
    /// Unique event id
    pub id: Uuid,
    /// Which alarm fired
    pub label: ClockLabel,
    /// Engine time at which it fired
    pub fired_at: LocalTimestamp,
}

impl ClockEvent {
    pub fn new(label: ClockLabel, fired_at: LocalTimestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            label,
            fired_at,
        }
    }
}
