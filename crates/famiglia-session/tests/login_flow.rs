//! Integration tests for the login state machine against the in-memory
//! player store.

use std::sync::{Arc, Mutex};

use famiglia_protocol::{GODFATHER_ROLE, LoginRequest, Player, PlayerId};
use famiglia_session::{
    AdminCredentials, AuthError, Authenticator, LoginFlow, LoginOutcome, TokenAuthenticator,
    TokenConfig, TokenKind, TokenService,
};
use famiglia_store::{
    MemoryMissions, MemoryOffers, MemoryPlayers, MemoryStorage, MemoryTrades, PlayerPatch,
    PlayerStore, Storage, StoreError,
};

// =========================================================================
// Helpers
// =========================================================================

struct Fixture {
    flow: LoginFlow<MemoryStorage>,
    auth: TokenAuthenticator<MemoryStorage>,
    tokens: Arc<TokenService>,
    storage: Arc<MemoryStorage>,
    admin: AdminCredentials,
}

async fn fixture() -> Fixture {
    let storage = Arc::new(MemoryStorage::new());
    let players = storage.players();

    players
        .append(Player::new("Unassigned", "new@example.com", "pw"))
        .await
        .unwrap();

    let mut assigned = Player::new("Michael", "michael@example.com", "pw");
    assigned.assigned_role = "Consigliere".into();
    assigned.family = "Corleone".into();
    players.append(assigned).await.unwrap();

    let mut dead = Player::new("Luca", "luca@example.com", "pw");
    dead.assigned_role = "Enforcer".into();
    dead.role = "Enforcer".into();
    dead.player_id = Some(PlayerId::from("p-luca"));
    dead.alive = false;
    players.append(dead).await.unwrap();

    let tokens = Arc::new(TokenService::new(TokenConfig::default()));
    let admin = AdminCredentials::default();
    Fixture {
        flow: LoginFlow::new(Arc::clone(&tokens), admin.clone(), Arc::clone(&storage)),
        auth: TokenAuthenticator::new(Arc::clone(&tokens), admin.clone(), Arc::clone(&storage)),
        tokens,
        storage,
        admin,
    }
}

fn request(email: &str, password: &str, role: Option<&str>) -> LoginRequest {
    LoginRequest {
        email: Some(email.into()),
        username: None,
        password: password.into(),
        role: role.map(str::to_string),
    }
}

fn tokens_of(outcome: LoginOutcome) -> (String, String, Player) {
    match outcome {
        LoginOutcome::Authenticated { tokens, profile } => {
            (tokens.access_token, tokens.refresh_token, profile.player)
        }
        other => panic!("expected tokens, got {other:?}"),
    }
}

// =========================================================================
// First login
// =========================================================================

#[tokio::test]
async fn test_first_login_without_role_returns_probe_and_no_token() {
    let f = fixture().await;

    let outcome = f
        .flow
        .login(&request("michael@example.com", "pw", None))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        LoginOutcome::RoleSelectionRequired {
            assigned_role: "Consigliere".into()
        }
    );
    let stored = f
        .storage
        .players()
        .get_by_email("michael@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.is_claimed(), "a probe must not claim the record");
}

#[tokio::test]
async fn test_first_login_wrong_role_returns_role_mismatch() {
    let f = fixture().await;

    let result = f
        .flow
        .login(&request("michael@example.com", "pw", Some("Don")))
        .await;

    match result {
        Err(AuthError::RoleMismatch { expected }) => assert_eq!(expected, "Consigliere"),
        other => panic!("expected RoleMismatch, got {other:?}"),
    }
}

#[tokio::test]
async fn test_first_login_matching_role_claims_and_issues_tokens() {
    let f = fixture().await;

    let outcome = f
        .flow
        .login(&request("michael@example.com", "pw", Some("Consigliere")))
        .await
        .unwrap();
    let (access, refresh, profile) = tokens_of(outcome);

    assert!(profile.is_claimed());
    assert_eq!(profile.role, "Consigliere");
    assert!(profile.registered);

    let claims = f.tokens.validate(&access, Some(TokenKind::Access)).unwrap();
    assert_eq!(Some(&claims.subject.player_id), profile.player_id.as_ref());
    assert_eq!(claims.subject.family, "Corleone");
    assert!(f.tokens.validate(&refresh, Some(TokenKind::Refresh)).is_ok());

    let identity = f.auth.authenticate(&access).await.unwrap();
    assert_eq!(identity.profile().email, "michael@example.com");
}

#[tokio::test]
async fn test_repeat_first_login_same_role_keeps_player_id() {
    let f = fixture().await;
    let req = request("michael@example.com", "pw", Some("Consigliere"));

    let (_, _, first) = tokens_of(f.flow.login(&req).await.unwrap());
    let (_, _, second) = tokens_of(f.flow.login(&req).await.unwrap());

    assert_eq!(first.player_id, second.player_id);
}

// =========================================================================
// Repeat login
// =========================================================================

#[tokio::test]
async fn test_repeat_login_without_role_returns_role_required() {
    let f = fixture().await;
    f.flow
        .login(&request("michael@example.com", "pw", Some("Consigliere")))
        .await
        .unwrap();

    let result = f.flow.login(&request("michael@example.com", "pw", None)).await;

    assert!(matches!(result, Err(AuthError::RoleRequired)));
}

#[tokio::test]
async fn test_repeat_login_role_is_case_sensitive() {
    let f = fixture().await;
    f.flow
        .login(&request("michael@example.com", "pw", Some("Consigliere")))
        .await
        .unwrap();

    let result = f
        .flow
        .login(&request("michael@example.com", "pw", Some("consigliere")))
        .await;

    assert!(matches!(result, Err(AuthError::RoleMismatch { .. })));
}

#[tokio::test]
async fn test_repeat_login_after_admin_reassigns_uses_stored_role() {
    let f = fixture().await;
    f.flow
        .login(&request("michael@example.com", "pw", Some("Consigliere")))
        .await
        .unwrap();
    f.storage
        .players()
        .update_by_email(
            "michael@example.com",
            PlayerPatch {
                assigned_role: Some("Don".into()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

    let result = f
        .flow
        .login(&request("michael@example.com", "pw", Some("Consigliere")))
        .await;

    assert!(result.is_ok(), "claimed players log in with their confirmed role");
}

/// Serves one stale `get_by_email` snapshot, then reads through. Stands in
/// for a second login that read the record before the first one claimed it.
#[derive(Default)]
struct StalePlayers {
    inner: MemoryPlayers,
    stale: Mutex<Option<Player>>,
}

impl PlayerStore for StalePlayers {
    async fn get_by_email(&self, email: &str) -> Result<Option<Player>, StoreError> {
        let stale = self.stale.lock().unwrap().take();
        match stale {
            Some(p) => Ok(Some(p)),
            None => self.inner.get_by_email(email).await,
        }
    }

    async fn get_by_id(&self, id: &PlayerId) -> Result<Option<Player>, StoreError> {
        self.inner.get_by_id(id).await
    }

    async fn update(
        &self,
        id: &PlayerId,
        patch: PlayerPatch,
        expected_version: Option<u64>,
    ) -> Result<Player, StoreError> {
        self.inner.update(id, patch, expected_version).await
    }

    async fn update_by_email(
        &self,
        email: &str,
        patch: PlayerPatch,
        expected_version: Option<u64>,
    ) -> Result<Player, StoreError> {
        self.inner.update_by_email(email, patch, expected_version).await
    }

    async fn list_all(&self) -> Result<Vec<Player>, StoreError> {
        self.inner.list_all().await
    }

    async fn append(&self, player: Player) -> Result<Player, StoreError> {
        self.inner.append(player).await
    }
}

#[derive(Default)]
struct StaleStorage {
    players: StalePlayers,
    missions: MemoryMissions,
    offers: MemoryOffers,
    trades: MemoryTrades,
}

impl Storage for StaleStorage {
    type Players = StalePlayers;
    type Missions = MemoryMissions;
    type Offers = MemoryOffers;
    type Trades = MemoryTrades;

    fn players(&self) -> &StalePlayers {
        &self.players
    }
    fn missions(&self) -> &MemoryMissions {
        &self.missions
    }
    fn offers(&self) -> &MemoryOffers {
        &self.offers
    }
    fn trades(&self) -> &MemoryTrades {
        &self.trades
    }
}

#[tokio::test]
async fn test_first_login_racing_claim_keeps_first_player_id() {
    let storage = Arc::new(StaleStorage::default());
    let mut assigned = Player::new("Michael", "michael@example.com", "pw");
    assigned.assigned_role = "Consigliere".into();
    let before_claim = storage.players.inner.append(assigned).await.unwrap();
    let tokens = Arc::new(TokenService::new(TokenConfig::default()));
    let flow = LoginFlow::new(tokens, AdminCredentials::default(), Arc::clone(&storage));
    let login = request("michael@example.com", "pw", Some("Consigliere"));

    let (_, _, first) = tokens_of(flow.login(&login).await.unwrap());
    *storage.players.stale.lock().unwrap() = Some(before_claim);
    let (_, _, second) = tokens_of(flow.login(&login).await.unwrap());

    assert!(first.player_id.is_some());
    assert_eq!(second.player_id, first.player_id, "the losing claim reuses the stored id");
    let stored = storage
        .players
        .inner
        .get_by_email("michael@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.player_id, first.player_id);
}

// =========================================================================
// Failures
// =========================================================================

#[tokio::test]
async fn test_login_unknown_email_and_wrong_password_look_the_same() {
    let f = fixture().await;

    let unknown = f.flow.login(&request("nobody@example.com", "pw", None)).await;
    let wrong = f
        .flow
        .login(&request("michael@example.com", "nope", None))
        .await;

    assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
    assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn test_login_eliminated_player_is_blocked() {
    let f = fixture().await;

    let result = f
        .flow
        .login(&request("luca@example.com", "pw", Some("Enforcer")))
        .await;

    assert!(matches!(result, Err(AuthError::PlayerEliminated)));
}

#[tokio::test]
async fn test_login_eliminated_checked_after_credentials() {
    let f = fixture().await;

    let result = f
        .flow
        .login(&request("luca@example.com", "wrong", Some("Enforcer")))
        .await;

    assert!(matches!(result, Err(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn test_login_unassigned_returns_pending_approval() {
    let f = fixture().await;

    let result = f.flow.login(&request("new@example.com", "pw", None)).await;

    assert!(matches!(result, Err(AuthError::PendingApproval)));
}

#[tokio::test]
async fn test_login_missing_identifier_returns_invalid_request() {
    let f = fixture().await;
    let req = LoginRequest {
        password: "pw".into(),
        ..Default::default()
    };

    assert!(matches!(
        f.flow.login(&req).await,
        Err(AuthError::InvalidRequest(_))
    ));
}

#[tokio::test]
async fn test_login_username_alias_works() {
    let f = fixture().await;
    let req = LoginRequest {
        username: Some("michael@example.com".into()),
        password: "pw".into(),
        ..Default::default()
    };

    assert!(matches!(
        f.flow.login(&req).await,
        Ok(LoginOutcome::RoleSelectionRequired { .. })
    ));
}

// =========================================================================
// Admin bypass
// =========================================================================

#[tokio::test]
async fn test_admin_login_returns_synthetic_profile() {
    let f = fixture().await;

    let outcome = f
        .flow
        .login(&request(&f.admin.email, &f.admin.password, None))
        .await
        .unwrap();

    match outcome {
        LoginOutcome::Authenticated { tokens, profile } => {
            assert!(profile.is_admin);
            assert!(profile.player.alive);
            assert_eq!(profile.player.role, GODFATHER_ROLE);
            let identity = f.auth.authenticate(&tokens.access_token).await.unwrap();
            assert!(identity.is_admin());
        }
        other => panic!("expected tokens, got {other:?}"),
    }
    assert_eq!(f.storage.players().list_all().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_admin_login_other_role_returns_role_mismatch() {
    let f = fixture().await;

    let result = f
        .flow
        .login(&request(&f.admin.email, &f.admin.password, Some("Don")))
        .await;

    assert!(matches!(result, Err(AuthError::RoleMismatch { .. })));
}

#[tokio::test]
async fn test_admin_login_wrong_password_returns_invalid_credentials() {
    let f = fixture().await;

    let result = f
        .flow
        .login(&request(&f.admin.email, "guess", Some(GODFATHER_ROLE)))
        .await;

    assert!(matches!(result, Err(AuthError::InvalidCredentials)));
}
