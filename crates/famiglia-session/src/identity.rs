//! Turning a bearer token into "who is calling".
//!
//! Every authenticated request resolves its token exactly once into an
//! [`Identity`]. Downstream code matches on the variant; nothing compares
//! sentinel strings to decide whether the caller is the administrator.
//!
//! The [`Authenticator`] trait is the seam: the server calls it, the
//! default [`TokenAuthenticator`] implements it with JWTs plus a player
//! lookup, and tests can plug in anything else.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use famiglia_protocol::{GODFATHER_ROLE, Player, PlayerId};
use famiglia_store::{PlayerStore, Storage};

use crate::{AuthError, Claims, Subject, TokenKind, TokenService};

/// Player id carried by admin tokens.
pub const ADMIN_PLAYER_ID: &str = "admin-uuid";

/// Family name shown on the admin's synthetic profile.
pub const ADMIN_FAMILY: &str = "Administration";

/// Balance shown on the admin's synthetic profile.
pub const ADMIN_BALANCE: f64 = 999_999_999.0;

// ---------------------------------------------------------------------------
// AdminCredentials
// ---------------------------------------------------------------------------

/// The single administrator login.
///
/// The admin is not a stored player: logging in with this email bypasses
/// the player store entirely.
#[derive(Clone)]
pub struct AdminCredentials {
    pub email: String,
    pub password: String,
    /// Display name on the synthetic profile.
    pub name: String,
}

impl Default for AdminCredentials {
    fn default() -> Self {
        Self {
            email: "godfather@famiglia.local".to_string(),
            password: "change-me-in-production".to_string(),
            name: "The Godfather".to_string(),
        }
    }
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .finish()
    }
}

impl AdminCredentials {
    /// Returns `true` if `email` is the admin login.
    pub fn is_admin_email(&self, email: &str) -> bool {
        !email.is_empty() && email == self.email
    }

    /// Token subject for the admin.
    pub fn subject(&self) -> Subject {
        Subject {
            player_id: PlayerId::from(ADMIN_PLAYER_ID),
            email: self.email.clone(),
            role: GODFATHER_ROLE.to_string(),
            family: ADMIN_FAMILY.to_string(),
        }
    }

    /// The always-alive, max-balance profile the admin is shown as.
    pub fn profile(&self) -> Player {
        let mut player = Player::new(&self.name, &self.email, "");
        player.player_id = Some(PlayerId::from(ADMIN_PLAYER_ID));
        player.role = GODFATHER_ROLE.to_string();
        player.assigned_role = GODFATHER_ROLE.to_string();
        player.family = ADMIN_FAMILY.to_string();
        player.balance = ADMIN_BALANCE;
        player.registered = true;
        player
    }

    fn matches(&self, subject: &Subject) -> bool {
        subject.player_id.as_str() == ADMIN_PLAYER_ID || self.is_admin_email(&subject.email)
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// The caller behind a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Identity {
    /// The administrator, with their synthetic profile.
    Admin(Player),
    /// A claimed player, as currently stored.
    Player(Player),
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin(_))
    }

    /// The caller's profile (synthetic for the admin).
    pub fn profile(&self) -> &Player {
        match self {
            Self::Admin(p) | Self::Player(p) => p,
        }
    }

    pub fn into_profile(self) -> Player {
        match self {
            Self::Admin(p) | Self::Player(p) => p,
        }
    }

    /// The caller's id. Always present: only claimed players resolve.
    pub fn player_id(&self) -> PlayerId {
        self.profile()
            .player_id
            .clone()
            .unwrap_or_else(|| PlayerId::from(ADMIN_PLAYER_ID))
    }

    pub fn role(&self) -> &str {
        &self.profile().role
    }

    pub fn family(&self) -> &str {
        &self.profile().family
    }
}

// ---------------------------------------------------------------------------
// Authenticator
// ---------------------------------------------------------------------------

/// Validates a bearer token and says who it belongs to.
///
/// - `Send + Sync + 'static`: one instance is shared by every request
///   handler for the life of the server.
pub trait Authenticator: Send + Sync + 'static {
    /// Resolves an access token into an [`Identity`].
    ///
    /// # Errors
    /// - token errors from [`TokenService::validate`]
    /// - [`AuthError::PlayerNotFound`] if the token names a deleted player
    fn authenticate(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<Identity, AuthError>> + Send;
}

/// The default [`Authenticator`]: JWT validation plus a player lookup.
pub struct TokenAuthenticator<S> {
    tokens: Arc<TokenService>,
    admin: AdminCredentials,
    storage: Arc<S>,
}

impl<S: Storage> TokenAuthenticator<S> {
    pub fn new(tokens: Arc<TokenService>, admin: AdminCredentials, storage: Arc<S>) -> Self {
        Self {
            tokens,
            admin,
            storage,
        }
    }

    /// Maps already-validated claims to an identity.
    pub async fn resolve(&self, claims: &Claims) -> Result<Identity, AuthError> {
        if self.admin.matches(&claims.subject) {
            return Ok(Identity::Admin(self.admin.profile()));
        }
        self.storage
            .players()
            .get_by_id(&claims.subject.player_id)
            .await?
            .map(Identity::Player)
            .ok_or(AuthError::PlayerNotFound)
    }

    /// Like [`Authenticator::authenticate`] but accepts either token kind.
    /// Backs the token verification endpoint.
    pub async fn verify(&self, token: &str) -> Result<(Claims, Option<Identity>), AuthError> {
        let claims = self.tokens.validate(token, None)?;
        let identity = match self.resolve(&claims).await {
            Ok(identity) => Some(identity),
            Err(AuthError::PlayerNotFound) => None,
            Err(e) => return Err(e),
        };
        Ok((claims, identity))
    }
}

impl<S: Storage> Authenticator for TokenAuthenticator<S> {
    async fn authenticate(&self, access_token: &str) -> Result<Identity, AuthError> {
        let claims = self.tokens.validate(access_token, Some(TokenKind::Access))?;
        self.resolve(&claims).await
    }
}

impl<S> fmt::Debug for TokenAuthenticator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuthenticator")
            .field("admin", &self.admin)
            .finish_non_exhaustive()
    }
}
