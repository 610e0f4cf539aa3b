use kairos_core::Timestamp;

/// Port for time abstraction
///
/// This allows the engine to read "now" from different sources:
/// - Real system time for production
/// - A manually advanced clock for deterministic tests
/// - An accelerated clock for fast-forward simulation
///
/// No monotonicity is enforced at this boundary: the engine only ever reads
/// the latest value once per sampling call, and a test source may be set
/// arbitrarily between calls.
pub trait TimeSource: Send + Sync {
    /// Get the current time according to this source
    fn now(&self) -> Timestamp;

    /// Get the source's name/identifier for debugging
    fn name(&self) -> &str {
        "TimeSource"
    }
}
