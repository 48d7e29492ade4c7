//! Signed session tokens (HS256 JWTs).
//!
//! A login hands out two tokens:
//!
//! - an **access** token (24 h) sent as `Authorization: Bearer ...` on
//!   every request, and
//! - a **refresh** token (7 d) that can only be traded for a new access
//!   token.
//!
//! Both carry the same identity claims plus a `type` claim. Tokens minted
//! before the `type` claim existed are accepted wherever either kind is.
//!
//! Tokens are stateless: there is no revocation list, so a token stays
//! valid until it expires even if the player is eliminated. Handlers
//! re-read the player record where that matters.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use famiglia_protocol::{Player, PlayerId};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::AuthError;

// ---------------------------------------------------------------------------
// Claims
// ---------------------------------------------------------------------------

/// Which of the two token kinds a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Access => write!(f, "access"),
            Self::Refresh => write!(f, "refresh"),
        }
    }
}

/// Who a token speaks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub player_id: PlayerId,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub family: String,
}

impl Subject {
    /// Builds the subject for a claimed player.
    ///
    /// Returns `None` if the player has no id yet.
    pub fn for_player(player: &Player) -> Option<Self> {
        let player_id = player.player_id.clone().filter(|_| player.is_claimed())?;
        Some(Self {
            player_id,
            email: player.email.clone(),
            role: player.role.clone(),
            family: player.family.clone(),
        })
    }
}

/// The full payload of a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(flatten)]
    pub subject: Subject,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TokenKind>,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

/// An access token and its matching refresh token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

// ---------------------------------------------------------------------------
// TokenConfig
// ---------------------------------------------------------------------------

/// Signing key and lifetimes.
#[derive(Clone)]
pub struct TokenConfig {
    /// HMAC secret. Every process that validates tokens must share it.
    pub secret: String,
    /// Lifetime of access tokens. Default: 24 h.
    pub access_ttl: Duration,
    /// Lifetime of refresh tokens. Default: 7 days.
    pub refresh_ttl: Duration,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            access_ttl: Duration::hours(24),
            refresh_ttl: Duration::days(7),
        }
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// TokenService
// ---------------------------------------------------------------------------

/// Issues and validates tokens. Cheap to share behind an `Arc`.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    config: TokenConfig,
}

impl TokenService {
    pub fn new(config: TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            config,
        }
    }

    /// Signs a token of `kind` for `subject`, expiring relative to now.
    pub fn issue(&self, subject: &Subject, kind: TokenKind) -> Result<String, AuthError> {
        self.issue_at(subject, kind, Utc::now())
    }

    /// Signs a token as if it were issued at `issued_at`.
    pub fn issue_at(
        &self,
        subject: &Subject,
        kind: TokenKind,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let ttl = match kind {
            TokenKind::Access => self.config.access_ttl,
            TokenKind::Refresh => self.config.refresh_ttl,
        };
        let claims = Claims {
            subject: subject.clone(),
            kind: Some(kind),
            exp: (issued_at + ttl).timestamp(),
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))?;
        info!(player_id = %subject.player_id, %kind, "issued token");
        Ok(token)
    }

    /// Issues an access token and a refresh token together.
    pub fn issue_pair(&self, subject: &Subject) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.issue(subject, TokenKind::Access)?,
            refresh_token: self.issue(subject, TokenKind::Refresh)?,
        })
    }

    /// Checks signature and expiry, and the kind if one is expected.
    ///
    /// A token without a `type` claim passes any kind check.
    pub fn validate(&self, token: &str, expected: Option<TokenKind>) -> Result<Claims, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenMalformed(e.to_string()),
            })?;
        let claims = data.claims;

        if let (Some(expected), Some(actual)) = (expected, claims.kind) {
            if expected != actual {
                warn!(%expected, %actual, "token kind mismatch");
                return Err(AuthError::TokenWrongKind { expected });
            }
        }
        Ok(claims)
    }

    /// Trades a refresh token for a fresh access token with the same
    /// identity claims.
    pub fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let claims = self.validate(refresh_token, Some(TokenKind::Refresh))?;
        let token = self.issue(&claims.subject, TokenKind::Access)?;
        info!(player_id = %claims.subject.player_id, "refreshed access token");
        Ok(token)
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
