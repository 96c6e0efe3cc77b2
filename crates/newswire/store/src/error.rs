use newswire_types::EventId;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store-layer errors. `Unavailable` is fatal for the affected event; the
/// pipeline surfaces it rather than dropping the event silently.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("event not found: {0}")]
    NotFound(EventId),

    #[error("event {0} already stored")]
    Conflict(EventId),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}
