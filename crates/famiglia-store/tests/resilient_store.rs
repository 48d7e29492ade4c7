//! Integration tests for the timeout/retry decorator.
//!
//! Uses a player store that fails a configurable number of times before
//! delegating to the in-memory one. Tests run with paused, auto-advancing
//! time so backoff sleeps and timeouts resolve instantly.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use famiglia_protocol::{Player, PlayerId};
use famiglia_store::{
    MemoryMissions, MemoryOffers, MemoryPlayers, MemoryTrades, PlayerPatch, PlayerStore,
    Resilient, RetryPolicy, Storage, StoreError,
};

// =========================================================================
// Helpers
// =========================================================================

#[derive(Debug, Clone, Copy)]
enum Failure {
    Unavailable,
    Hang,
    Conflict,
}

/// Fails the first `failures` calls, then behaves like `MemoryPlayers`.
#[derive(Default)]
struct FlakyPlayers {
    inner: MemoryPlayers,
    failures: AtomicU32,
    calls: Arc<AtomicU32>,
    mode: Option<Failure>,
}

impl FlakyPlayers {
    async fn maybe_fail(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining == 0 {
            return Ok(());
        }
        self.failures.store(remaining - 1, Ordering::SeqCst);
        match self.mode {
            Some(Failure::Unavailable) => Err(StoreError::Unavailable("sheet quota".into())),
            Some(Failure::Hang) => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            }
            Some(Failure::Conflict) => Err(StoreError::Conflict {
                entity: "player".into(),
                expected: 0,
                found: 1,
            }),
            None => Ok(()),
        }
    }
}

impl PlayerStore for FlakyPlayers {
    async fn get_by_email(&self, email: &str) -> Result<Option<Player>, StoreError> {
        self.maybe_fail().await?;
        self.inner.get_by_email(email).await
    }

    async fn get_by_id(&self, id: &PlayerId) -> Result<Option<Player>, StoreError> {
        self.maybe_fail().await?;
        self.inner.get_by_id(id).await
    }

    async fn update(
        &self,
        id: &PlayerId,
        patch: PlayerPatch,
        expected_version: Option<u64>,
    ) -> Result<Player, StoreError> {
        self.maybe_fail().await?;
        self.inner.update(id, patch, expected_version).await
    }

    async fn update_by_email(
        &self,
        email: &str,
        patch: PlayerPatch,
        expected_version: Option<u64>,
    ) -> Result<Player, StoreError> {
        self.maybe_fail().await?;
        self.inner.update_by_email(email, patch, expected_version).await
    }

    async fn list_all(&self) -> Result<Vec<Player>, StoreError> {
        self.maybe_fail().await?;
        self.inner.list_all().await
    }

    async fn append(&self, player: Player) -> Result<Player, StoreError> {
        self.maybe_fail().await?;
        self.inner.append(player).await
    }
}

#[derive(Default)]
struct FlakyStorage {
    players: FlakyPlayers,
    missions: MemoryMissions,
    offers: MemoryOffers,
    trades: MemoryTrades,
}

impl Storage for FlakyStorage {
    type Players = FlakyPlayers;
    type Missions = MemoryMissions;
    type Offers = MemoryOffers;
    type Trades = MemoryTrades;

    fn players(&self) -> &FlakyPlayers {
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

/// Returns the decorated store and a counter of backend calls.
async fn flaky(mode: Failure, failures: u32) -> (Resilient<FlakyStorage>, Arc<AtomicU32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let storage = FlakyStorage {
        players: FlakyPlayers {
            failures: AtomicU32::new(failures),
            calls: Arc::clone(&calls),
            mode: Some(mode),
            ..Default::default()
        },
        ..Default::default()
    };
    storage
        .players
        .inner
        .append(Player::new("Fredo", "fredo@example.com", "pw"))
        .await
        .unwrap();
    (Resilient::new(storage, RetryPolicy::default()), calls)
}

// =========================================================================
// Retry behaviour
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_retry_recovers_after_transient_failures() {
    let (storage, calls) = flaky(Failure::Unavailable, 2).await;

    let found = storage
        .players()
        .get_by_email("fredo@example.com")
        .await
        .unwrap();

    assert!(found.is_some(), "third attempt should reach the backend");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_retry_gives_up_after_max_retries() {
    let (storage, calls) = flaky(Failure::Unavailable, 3).await;

    let result = storage.players().get_by_email("fredo@example.com").await;

    assert!(matches!(result, Err(StoreError::Unavailable(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 3, "one attempt plus two retries");
}

#[tokio::test(start_paused = true)]
async fn test_timeout_surfaces_as_unavailable_then_retries() {
    let (storage, _) = flaky(Failure::Hang, 1).await;

    let found = storage.players().list_all().await.unwrap();

    assert_eq!(found.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_every_attempt_returns_unavailable() {
    let (storage, _) = flaky(Failure::Hang, 10).await;

    let result = storage.players().list_all().await;

    match result {
        Err(StoreError::Unavailable(msg)) => assert!(msg.contains("timed out")),
        other => panic!("expected Unavailable, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_conflict_is_not_retried() {
    let (storage, calls) = flaky(Failure::Conflict, 1).await;

    let result = storage
        .players()
        .update_by_email("fredo@example.com", PlayerPatch::default(), None)
        .await;

    assert!(matches!(result, Err(StoreError::Conflict { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// =========================================================================
// Writes that are not safe to repeat
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_append_timeout_is_not_retried() {
    let (storage, calls) = flaky(Failure::Hang, 1).await;

    let result = storage
        .players()
        .append(Player::new("Kay", "kay@example.com", "pw"))
        .await;

    match result {
        Err(StoreError::Unavailable(msg)) => assert!(msg.contains("outcome unknown")),
        other => panic!("expected Unavailable, got {other:?}"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(storage.players().list_all().await.unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_append_reported_unavailable_is_retried() {
    let (storage, calls) = flaky(Failure::Unavailable, 1).await;

    storage
        .players()
        .append(Player::new("Kay", "kay@example.com", "pw"))
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
