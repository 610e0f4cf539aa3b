use thiserror::Error;

/// Configuration errors rejected synchronously at registration or
/// construction. Runtime faults (calendar outages, slow subscribers) are
/// logged and absorbed instead - `tock()` never fails.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Alarm name must not be empty")]
    EmptyName,

    #[error("'{0}' is a reserved session label")]
    ReservedLabel(String),

    #[error("An alarm named '{0}' is already registered")]
    DuplicateName(String),

    #[error("Interval duration must be positive, got {0} ms")]
    NonPositiveInterval(i64),

    #[error("Session schedule boundaries must be strictly ordered within the day")]
    UnorderedSchedule,
}

pub type Result<T> = std::result::Result<T, EngineError>;
