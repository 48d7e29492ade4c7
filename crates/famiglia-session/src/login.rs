//! The two-phase onboarding flow.
//!
//! Each player record moves through three states:
//!
//! ```text
//!   Unassigned ──(admin assigns role)──→ AssignedUnclaimed ──(first login)──→ Claimed
//! ```
//!
//! - **Unassigned**: no `assigned_role`. Login fails with
//!   [`AuthError::PendingApproval`].
//! - **AssignedUnclaimed**: the admin set `assigned_role` but the player has
//!   no id yet. A login without a role is a probe: it returns the assigned
//!   role and no token. A login naming the assigned role claims the
//!   record: a fresh UUID becomes the player id and `role` is confirmed.
//! - **Claimed**: every login must name the stored role exactly.
//!
//! The admin email never reaches this machine; it has its own path.

use std::sync::Arc;

use famiglia_protocol::{
    GODFATHER_ROLE, LoginRequest, LoginResponse, Player, PlayerId, ProfileView,
};
use famiglia_store::{PlayerPatch, PlayerStore, Storage, StoreError};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{AdminCredentials, AuthError, Subject, TokenPair, TokenService};

/// `token_type` reported to clients.
pub const BEARER: &str = "bearer";

// ---------------------------------------------------------------------------
// ClaimState
// ---------------------------------------------------------------------------

/// Where a player record is in the onboarding flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimState {
    Unassigned,
    AssignedUnclaimed,
    Claimed,
}

impl ClaimState {
    /// Reads the state off a stored record.
    pub fn of(player: &Player) -> Self {
        if player.is_claimed() {
            Self::Claimed
        } else if player.assigned_role.is_empty() {
            Self::Unassigned
        } else {
            Self::AssignedUnclaimed
        }
    }

    /// Returns the next state, or `None` if this state is terminal.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Unassigned => Some(Self::AssignedUnclaimed),
            Self::AssignedUnclaimed => Some(Self::Claimed),
            Self::Claimed => None,
        }
    }

    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

// ---------------------------------------------------------------------------
// LoginOutcome
// ---------------------------------------------------------------------------

/// What a successful login call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    /// Tokens were issued.
    Authenticated {
        tokens: TokenPair,
        profile: ProfileView,
    },
    /// First-login probe: the client must confirm this role.
    RoleSelectionRequired { assigned_role: String },
}

impl LoginOutcome {
    pub fn into_response(self) -> LoginResponse {
        match self {
            Self::Authenticated { tokens, profile } => LoginResponse {
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
                token_type: BEARER.to_string(),
                player: Some(profile),
                is_first_login: false,
                assigned_role: None,
            },
            Self::RoleSelectionRequired { assigned_role } => LoginResponse {
                access_token: String::new(),
                refresh_token: String::new(),
                token_type: BEARER.to_string(),
                player: None,
                is_first_login: true,
                assigned_role: Some(assigned_role),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// LoginFlow
// ---------------------------------------------------------------------------

/// Runs the login state machine against a player store.
pub struct LoginFlow<S> {
    tokens: Arc<TokenService>,
    admin: AdminCredentials,
    storage: Arc<S>,
}

impl<S: Storage> LoginFlow<S> {
    pub fn new(tokens: Arc<TokenService>, admin: AdminCredentials, storage: Arc<S>) -> Self {
        Self {
            tokens,
            admin,
            storage,
        }
    }

    /// Authenticates a login request.
    ///
    /// Checks run in this order: identifier present, admin bypass,
    /// credentials, alive, assigned, then the claim state.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginOutcome, AuthError> {
        let email = request
            .login()
            .ok_or_else(|| AuthError::InvalidRequest("email or username is required".into()))?;
        let role = request.role.as_deref().filter(|r| !r.is_empty());

        if self.admin.is_admin_email(email) {
            return self.admin_login(&request.password, role);
        }

        let player = self
            .storage
            .players()
            .get_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        if player.password != request.password {
            warn!(%email, "login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }
        if !player.alive {
            return Err(AuthError::PlayerEliminated);
        }

        match ClaimState::of(&player) {
            ClaimState::Unassigned => Err(AuthError::PendingApproval),
            ClaimState::AssignedUnclaimed => self.first_login(player, role).await,
            ClaimState::Claimed => self.repeat_login(player, role),
        }
    }

    fn admin_login(&self, password: &str, role: Option<&str>) -> Result<LoginOutcome, AuthError> {
        if password != self.admin.password {
            warn!("admin login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }
        if role.is_some_and(|r| r != GODFATHER_ROLE) {
            return Err(AuthError::RoleMismatch {
                expected: GODFATHER_ROLE.to_string(),
            });
        }
        let tokens = self.tokens.issue_pair(&self.admin.subject())?;
        info!("admin logged in");
        Ok(LoginOutcome::Authenticated {
            tokens,
            profile: ProfileView {
                player: self.admin.profile(),
                is_admin: true,
            },
        })
    }

    async fn first_login(
        &self,
        player: Player,
        role: Option<&str>,
    ) -> Result<LoginOutcome, AuthError> {
        let Some(role) = role else {
            info!(email = %player.email, "first login probe");
            return Ok(LoginOutcome::RoleSelectionRequired {
                assigned_role: player.assigned_role,
            });
        };
        if role != player.assigned_role {
            return Err(AuthError::RoleMismatch {
                expected: player.assigned_role,
            });
        }

        if !ClaimState::of(&player).can_transition_to(ClaimState::Claimed) {
            return self.repeat_login(player, Some(role));
        }

        let player_id = PlayerId(Uuid::new_v4().to_string());
        let claim = self
            .storage
            .players()
            .update_by_email(
                &player.email,
                PlayerPatch {
                    player_id: Some(player_id.clone()),
                    role: Some(player.assigned_role.clone()),
                    registered: Some(true),
                    ..Default::default()
                },
                Some(player.version),
            )
            .await;
        let claimed = match claim {
            Ok(claimed) => claimed,
            Err(StoreError::Conflict { .. }) => {
                // Someone wrote the record since we read it, most likely a
                // concurrent first login. Keep whatever id won.
                let fresh = self
                    .storage
                    .players()
                    .get_by_email(&player.email)
                    .await?
                    .ok_or(AuthError::InvalidCredentials)?;
                if ClaimState::of(&fresh) != ClaimState::Claimed {
                    return Err(StoreError::Conflict {
                        entity: format!("player {}", player.email),
                        expected: player.version,
                        found: fresh.version,
                    }
                    .into());
                }
                info!(email = %fresh.email, "claim raced, using the stored id");
                return self.repeat_login(fresh, Some(role));
            }
            Err(e) => return Err(e.into()),
        };
        info!(%player_id, email = %claimed.email, role = %claimed.role, "player claimed identity");
        self.authenticated(claimed)
    }

    fn repeat_login(&self, player: Player, role: Option<&str>) -> Result<LoginOutcome, AuthError> {
        let role = role.ok_or(AuthError::RoleRequired)?;
        if role != player.role {
            return Err(AuthError::RoleMismatch {
                expected: player.role,
            });
        }
        self.authenticated(player)
    }

    fn authenticated(&self, player: Player) -> Result<LoginOutcome, AuthError> {
        let subject = Subject::for_player(&player)
            .ok_or_else(|| AuthError::InvalidRequest("player has no id".into()))?;
        let tokens = self.tokens.issue_pair(&subject)?;
        info!(player_id = %subject.player_id, "player logged in");
        Ok(LoginOutcome::Authenticated {
            tokens,
            profile: ProfileView {
                player,
                is_admin: false,
            },
        })
    }
}

impl<S> std::fmt::Debug for LoginFlow<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginFlow")
            .field("admin", &self.admin)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_state_of_fresh_player_is_unassigned() {
        let player = Player::new("Neri", "neri@example.com", "pw");
        assert_eq!(ClaimState::of(&player), ClaimState::Unassigned);
    }

    #[test]
    fn test_claim_state_follows_onboarding_order() {
        let mut player = Player::new("Neri", "neri@example.com", "pw");
        player.assigned_role = "Enforcer".into();
        assert_eq!(ClaimState::of(&player), ClaimState::AssignedUnclaimed);

        player.player_id = Some(PlayerId::from("p-neri"));
        assert_eq!(ClaimState::of(&player), ClaimState::Claimed);
    }

    #[test]
    fn test_claim_state_cannot_skip_or_reverse() {
        assert!(ClaimState::Unassigned.can_transition_to(ClaimState::AssignedUnclaimed));
        assert!(!ClaimState::Unassigned.can_transition_to(ClaimState::Claimed));
        assert!(!ClaimState::Claimed.can_transition_to(ClaimState::AssignedUnclaimed));
    }

    #[test]
    fn test_into_response_probe_has_no_tokens() {
        let response = LoginOutcome::RoleSelectionRequired {
            assigned_role: "Consigliere".into(),
        }
        .into_response();

        assert!(response.is_first_login);
        assert!(response.access_token.is_empty());
        assert!(response.refresh_token.is_empty());
        assert_eq!(response.assigned_role.as_deref(), Some("Consigliere"));
    }
}
