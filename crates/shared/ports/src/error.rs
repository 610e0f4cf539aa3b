use thiserror::Error;

/// Errors surfaced by trading-calendar adapters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("Calendar provider unavailable: {0}")]
    Unavailable(String),

    #[error("Date out of calendar range: {0}")]
    OutOfRange(String),
}

pub type CalendarResult<T> = std::result::Result<T, CalendarError>;
