//! Error types for the session layer.

use famiglia_store::StoreError;

use crate::TokenKind;

/// Errors from logging in, validating tokens, or resolving an identity.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown email or wrong password. The two are deliberately
    /// indistinguishable to the caller.
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("token has expired, please login again or refresh your token")]
    TokenExpired,

    /// Bad signature, bad encoding, or missing required claims.
    #[error("invalid token: {0}")]
    TokenMalformed(String),

    /// A refresh token was presented where an access token is required,
    /// or the other way round.
    #[error("invalid token type, expected {expected} token")]
    TokenWrongKind { expected: TokenKind },

    /// The role sent at login is not the player's role.
    #[error("role mismatch, you are registered as '{expected}'")]
    RoleMismatch { expected: String },

    /// A claimed player logged in without naming their role.
    #[error("role selection is required for login")]
    RoleRequired,

    #[error("your character has been eliminated from the game")]
    PlayerEliminated,

    /// No role has been assigned by the admin yet.
    #[error("your account is pending admin approval")]
    PendingApproval,

    /// The token is valid but names a player that no longer exists.
    #[error("player not found")]
    PlayerNotFound,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Encoding a token failed. Only happens with a broken key.
    #[error("could not sign token: {0}")]
    Signing(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
