//! Unified error type for the Famiglia server.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use famiglia_game::GameError;
use famiglia_session::AuthError;
use famiglia_store::StoreError;
use serde_json::json;

/// Top-level error that wraps every crate-specific error.
///
/// Handlers return `Result<_, FamigliaError>` and let `?` convert the
/// sub-crate errors. The response body is always
/// `{"success": false, "detail": "<reason>"}`.
#[derive(Debug, thiserror::Error)]
pub enum FamigliaError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The request carried no usable `Authorization: Bearer` header.
    #[error("no authorization token provided")]
    MissingToken,

    /// Binding or serving the listener failed.
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FamigliaError {
    /// The HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Auth(e) => auth_status(e),
            Self::Game(e) => game_status(e),
            Self::Store(e) => store_status(e),
            Self::MissingToken => StatusCode::UNAUTHORIZED,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn auth_status(e: &AuthError) -> StatusCode {
    match e {
        AuthError::InvalidCredentials
        | AuthError::TokenExpired
        | AuthError::TokenMalformed(_)
        | AuthError::TokenWrongKind { .. }
        | AuthError::PlayerNotFound => StatusCode::UNAUTHORIZED,
        AuthError::RoleMismatch { .. }
        | AuthError::PlayerEliminated
        | AuthError::PendingApproval => StatusCode::FORBIDDEN,
        AuthError::RoleRequired | AuthError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        AuthError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        AuthError::Store(e) => store_status(e),
    }
}

fn game_status(e: &GameError) -> StatusCode {
    match e {
        GameError::NotFound(_) => StatusCode::NOT_FOUND,
        GameError::InsufficientFunds { .. }
        | GameError::OutOfStock(_)
        | GameError::AlreadyCompleted(_)
        | GameError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        GameError::MarketClosed | GameError::PlayerEliminated(_) | GameError::Forbidden(_) => {
            StatusCode::FORBIDDEN
        }
        GameError::Conflict(_) => StatusCode::CONFLICT,
        GameError::Store(e) => store_status(e),
    }
}

fn store_status(e: &StoreError) -> StatusCode {
    match e {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::Conflict { .. } => StatusCode::CONFLICT,
        StoreError::InsufficientQuantity { .. }
        | StoreError::Duplicate(_)
        | StoreError::Rejected(_) => StatusCode::BAD_REQUEST,
        StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        StoreError::Seed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for FamigliaError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }
        let body = json!({ "success": false, "detail": self.to_string() });
        (status, Json(body)).into_response()
    }
}
