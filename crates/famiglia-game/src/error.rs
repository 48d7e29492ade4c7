//! Error types for the game rules.

use famiglia_protocol::{MissionId, OfferId};
use famiglia_store::StoreError;

/// Errors a game operation can return.
///
/// Store failures pass through as [`GameError::Store`]; the HTTP layer
/// decides their status code.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: f64, available: f64 },

    #[error("item out of stock (offer {0})")]
    OutOfStock(OfferId),

    #[error("black market is closed, opens at 11:11 PM IST")]
    MarketClosed,

    #[error("mission {0} already completed")]
    AlreadyCompleted(MissionId),

    /// The caller is eliminated and the action needs a living player.
    #[error("eliminated players cannot {0}")]
    PlayerEliminated(&'static str),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A record kept changing under us, past the retry budget.
    #[error("{0} is being modified concurrently, please retry")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl GameError {
    /// Shorthand for [`GameError::Forbidden`] with a static reason.
    pub fn forbidden(reason: &str) -> Self {
        Self::Forbidden(reason.to_string())
    }
}
