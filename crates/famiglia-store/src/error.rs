//! Error types for the storage layer.

/// Errors a store can return.
///
/// Only [`StoreError::Unavailable`] is transient; the retry decorator
/// retries it and nothing else. Every other variant describes a request
/// the store refused and is surfaced to the caller as-is.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// The record addressed by the call does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// An optimistic-concurrency check failed: someone else wrote the
    /// record between our read and our write.
    #[error("{entity} was modified concurrently (expected version {expected}, found {found})")]
    Conflict {
        entity: String,
        expected: u64,
        found: u64,
    },

    /// A decrement would take an offer's stock below zero.
    #[error("offer {offer} has only {available} left")]
    InsufficientQuantity { offer: String, available: u32 },

    /// A record with the same unique key already exists.
    #[error("duplicate {0}")]
    Duplicate(String),

    /// The write would break a record invariant (e.g. a negative balance).
    #[error("rejected write: {0}")]
    Rejected(String),

    /// The backend could not be reached or timed out.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A seed or import file could not be read.
    #[error("invalid seed data: {0}")]
    Seed(String),
}

impl StoreError {
    /// Returns `true` for errors worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
