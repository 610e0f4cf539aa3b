use thiserror::Error;

/// Errors surfaced by the event bus lifecycle and publish path
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    #[error("Event bus is already running")]
    AlreadyRunning,

    #[error("Event bus is not running")]
    NotRunning,

    #[error("Event bus queue is closed")]
    Closed,

    #[error("Event bus did not drain within {0:?}")]
    DrainTimeout(std::time::Duration),

    #[error("Event bus worker failed: {0}")]
    WorkerFailed(String),
}

pub type BusResult<T> = std::result::Result<T, BusError>;
