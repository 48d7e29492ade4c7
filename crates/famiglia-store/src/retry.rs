//! Timeout and retry decorator for any [`Storage`].
//!
//! Every call through [`Resilient`] is bounded by [`RetryPolicy::timeout`].
//! A timeout becomes [`StoreError::Unavailable`], and `Unavailable` (only)
//! is retried up to [`RetryPolicy::max_retries`] times with exponential
//! backoff plus random jitter. All other errors surface immediately.
//!
//! A timed-out write may still have landed. Writes that are not safe to
//! repeat (stock changes and appends) therefore go through
//! [`RetryPolicy::retry_write`], which retries only failures the backend
//! reported itself and gives up on a timeout. Reads, absolute patches and
//! version-checked writes use [`RetryPolicy::retry`].
//!
//! ```text
//! attempt 0 ──fail──→ sleep(base·2⁰ + jitter) ──→ attempt 1 ──fail──→ ...
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use famiglia_protocol::{Mission, MissionId, Offer, OfferId, Player, PlayerId, TradeRecord};
use rand::Rng;
use tracing::warn;

use crate::{
    MissionPatch, MissionStore, OfferStore, PlayerPatch, PlayerStore, Storage, StoreError,
    TradeStore,
};

// ---------------------------------------------------------------------------
// RetryPolicy
// ---------------------------------------------------------------------------

/// How long to wait for the store and how often to retry.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Default: 2.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each one after.
    pub base_delay: Duration,
    /// Upper bound of the random delay added to every backoff.
    pub max_jitter: Duration,
    /// Per-attempt deadline. Default: 5 s.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(50),
            max_jitter: Duration::from_millis(25),
            timeout: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Upper limit on retries; anything above is clamped.
    pub const MAX_RETRIES: u32 = 5;

    /// Clamp out-of-range values.
    ///
    /// - `max_retries` capped to [`Self::MAX_RETRIES`].
    /// - A zero `timeout` is replaced by the default.
    pub fn validated(mut self) -> Self {
        if self.max_retries > Self::MAX_RETRIES {
            warn!(
                retries = self.max_retries,
                max = Self::MAX_RETRIES,
                "max_retries exceeds maximum, clamping"
            );
            self.max_retries = Self::MAX_RETRIES;
        }
        if self.timeout.is_zero() {
            warn!("store timeout of zero would fail every call, using default");
            self.timeout = Self::default().timeout;
        }
        self
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = self.base_delay.saturating_mul(2u32.saturating_pow(attempt));
        let jitter_us = self.max_jitter.as_micros() as u64;
        let jitter = if jitter_us > 0 {
            Duration::from_micros(rand::rng().random_range(0..=jitter_us))
        } else {
            Duration::ZERO
        };
        exp + jitter
    }

    /// Runs `op` under the timeout, retrying transient failures.
    ///
    /// `op` is called once per attempt and must build a fresh future each
    /// time. Only for calls that are safe to repeat.
    pub async fn retry<T, F, Fut>(&self, label: &'static str, op: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        self.run(label, true, op).await
    }

    /// Like [`Self::retry`], but a timeout is returned without retrying.
    pub async fn retry_write<T, F, Fut>(&self, label: &'static str, op: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        self.run(label, false, op).await
    }

    async fn run<T, F, Fut>(
        &self,
        label: &'static str,
        retry_timeouts: bool,
        mut op: F,
    ) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut attempt = 0;
        loop {
            let result = match tokio::time::timeout(self.timeout, op()).await {
                Ok(result) => result,
                Err(_) if !retry_timeouts => {
                    warn!(op = label, timeout = ?self.timeout, "write timed out, not retrying");
                    return Err(StoreError::Unavailable(format!(
                        "{label} timed out after {:?}, outcome unknown",
                        self.timeout
                    )));
                }
                Err(_) => Err(StoreError::Unavailable(format!(
                    "{label} timed out after {:?}",
                    self.timeout
                ))),
            };
            match result {
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self.backoff(attempt);
                    attempt += 1;
                    warn!(op = label, attempt, ?delay, error = %e, "store call failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Per-store wrappers
// ---------------------------------------------------------------------------

/// [`PlayerStore`] half of [`Resilient`].
#[derive(Debug)]
pub struct RetryingPlayers<S> {
    inner: Arc<S>,
    policy: RetryPolicy,
}

impl<S: Storage> PlayerStore for RetryingPlayers<S> {
    async fn get_by_email(&self, email: &str) -> Result<Option<Player>, StoreError> {
        let players = self.inner.players();
        self.policy
            .retry("players.get_by_email", move || players.get_by_email(email))
            .await
    }

    async fn get_by_id(&self, id: &PlayerId) -> Result<Option<Player>, StoreError> {
        let players = self.inner.players();
        self.policy
            .retry("players.get_by_id", move || players.get_by_id(id))
            .await
    }

    async fn update(
        &self,
        id: &PlayerId,
        patch: PlayerPatch,
        expected_version: Option<u64>,
    ) -> Result<Player, StoreError> {
        let players = self.inner.players();
        let patch = &patch;
        self.policy
            .retry("players.update", move || {
                players.update(id, patch.clone(), expected_version)
            })
            .await
    }

    async fn update_by_email(
        &self,
        email: &str,
        patch: PlayerPatch,
        expected_version: Option<u64>,
    ) -> Result<Player, StoreError> {
        let players = self.inner.players();
        let patch = &patch;
        self.policy
            .retry("players.update_by_email", move || {
                players.update_by_email(email, patch.clone(), expected_version)
            })
            .await
    }

    async fn list_all(&self) -> Result<Vec<Player>, StoreError> {
        let players = self.inner.players();
        self.policy
            .retry("players.list_all", move || players.list_all())
            .await
    }

    async fn append(&self, player: Player) -> Result<Player, StoreError> {
        let players = self.inner.players();
        let player = &player;
        self.policy
            .retry_write("players.append", move || players.append(player.clone()))
            .await
    }
}

/// [`MissionStore`] half of [`Resilient`].
#[derive(Debug)]
pub struct RetryingMissions<S> {
    inner: Arc<S>,
    policy: RetryPolicy,
}

impl<S: Storage> MissionStore for RetryingMissions<S> {
    async fn list_all(&self) -> Result<Vec<Mission>, StoreError> {
        let missions = self.inner.missions();
        self.policy
            .retry("missions.list_all", move || missions.list_all())
            .await
    }

    async fn get(&self, id: MissionId) -> Result<Option<Mission>, StoreError> {
        let missions = self.inner.missions();
        self.policy
            .retry("missions.get", move || missions.get(id))
            .await
    }

    async fn update(
        &self,
        id: MissionId,
        patch: MissionPatch,
        expected_version: Option<u64>,
    ) -> Result<Mission, StoreError> {
        let missions = self.inner.missions();
        let patch = &patch;
        self.policy
            .retry("missions.update", move || {
                missions.update(id, patch.clone(), expected_version)
            })
            .await
    }

    async fn release(
        &self,
        id: MissionId,
        by: &PlayerId,
        expected_version: u64,
    ) -> Result<Mission, StoreError> {
        let missions = self.inner.missions();
        self.policy
            .retry("missions.release", move || {
                missions.release(id, by, expected_version)
            })
            .await
    }

    async fn append(&self, mission: Mission) -> Result<Mission, StoreError> {
        let missions = self.inner.missions();
        let mission = &mission;
        self.policy
            .retry_write("missions.append", move || missions.append(mission.clone()))
            .await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let missions = self.inner.missions();
        self.policy
            .retry("missions.clear", move || missions.clear())
            .await
    }
}

/// [`OfferStore`] half of [`Resilient`].
#[derive(Debug)]
pub struct RetryingOffers<S> {
    inner: Arc<S>,
    policy: RetryPolicy,
}

impl<S: Storage> OfferStore for RetryingOffers<S> {
    async fn list_all(&self) -> Result<Vec<Offer>, StoreError> {
        let offers = self.inner.offers();
        self.policy
            .retry("offers.list_all", move || offers.list_all())
            .await
    }

    async fn get(&self, id: OfferId) -> Result<Option<Offer>, StoreError> {
        let offers = self.inner.offers();
        self.policy
            .retry("offers.get", move || offers.get(id))
            .await
    }

    async fn decrement_quantity(&self, id: OfferId, by: u32) -> Result<Offer, StoreError> {
        let offers = self.inner.offers();
        self.policy
            .retry_write("offers.decrement_quantity", move || {
                offers.decrement_quantity(id, by)
            })
            .await
    }

    async fn increment_quantity(&self, id: OfferId, by: u32) -> Result<Offer, StoreError> {
        let offers = self.inner.offers();
        self.policy
            .retry_write("offers.increment_quantity", move || {
                offers.increment_quantity(id, by)
            })
            .await
    }

    async fn append(&self, offer: Offer) -> Result<Offer, StoreError> {
        let offers = self.inner.offers();
        let offer = &offer;
        self.policy
            .retry_write("offers.append", move || offers.append(offer.clone()))
            .await
    }

    async fn delete(&self, id: OfferId) -> Result<(), StoreError> {
        let offers = self.inner.offers();
        self.policy
            .retry("offers.delete", move || offers.delete(id))
            .await
    }
}

/// [`TradeStore`] half of [`Resilient`].
#[derive(Debug)]
pub struct RetryingTrades<S> {
    inner: Arc<S>,
    policy: RetryPolicy,
}

impl<S: Storage> TradeStore for RetryingTrades<S> {
    async fn append(&self, trade: TradeRecord) -> Result<TradeRecord, StoreError> {
        let trades = self.inner.trades();
        let trade = &trade;
        self.policy
            .retry_write("trades.append", move || trades.append(trade.clone()))
            .await
    }

    async fn list_all(&self) -> Result<Vec<TradeRecord>, StoreError> {
        let trades = self.inner.trades();
        self.policy
            .retry("trades.list_all", move || trades.list_all())
            .await
    }
}

// ---------------------------------------------------------------------------
// Resilient
// ---------------------------------------------------------------------------

/// Wraps a backend so every call gets a timeout and bounded retries.
///
/// ```rust,ignore
/// let storage = Resilient::new(MemoryStorage::new(), RetryPolicy::default());
/// storage.players().list_all().await?;
/// ```
#[derive(Debug)]
pub struct Resilient<S> {
    players: RetryingPlayers<S>,
    missions: RetryingMissions<S>,
    offers: RetryingOffers<S>,
    trades: RetryingTrades<S>,
}

impl<S: Storage> Resilient<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        let inner = Arc::new(inner);
        let policy = policy.validated();
        Self {
            players: RetryingPlayers {
                inner: Arc::clone(&inner),
                policy: policy.clone(),
            },
            missions: RetryingMissions {
                inner: Arc::clone(&inner),
                policy: policy.clone(),
            },
            offers: RetryingOffers {
                inner: Arc::clone(&inner),
                policy: policy.clone(),
            },
            trades: RetryingTrades { inner, policy },
        }
    }

}

impl<S: Storage> Storage for Resilient<S> {
    type Players = RetryingPlayers<S>;
    type Missions = RetryingMissions<S>;
    type Offers = RetryingOffers<S>;
    type Trades = RetryingTrades<S>;

    fn players(&self) -> &RetryingPlayers<S> {
        &self.players
    }

    fn missions(&self) -> &RetryingMissions<S> {
        &self.missions
    }

    fn offers(&self) -> &RetryingOffers<S> {
        &self.offers
    }

    fn trades(&self) -> &RetryingTrades<S> {
        &self.trades
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validated_clamps_retries() {
        let policy = RetryPolicy {
            max_retries: 50,
            ..Default::default()
        }
        .validated();
        assert_eq!(policy.max_retries, RetryPolicy::MAX_RETRIES);
    }

    #[test]
    fn test_validated_zero_timeout_uses_default() {
        let policy = RetryPolicy {
            timeout: Duration::ZERO,
            ..Default::default()
        }
        .validated();
        assert_eq!(policy.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_backoff_grows_exponentially_within_jitter() {
        let policy = RetryPolicy::default();
        for attempt in 0..3 {
            let delay = policy.backoff(attempt);
            let floor = policy.base_delay * 2u32.pow(attempt);
            assert!(delay >= floor, "attempt {attempt}: {delay:?} < {floor:?}");
            assert!(delay <= floor + policy.max_jitter);
        }
    }

    #[test]
    fn test_backoff_no_jitter_is_exact() {
        let policy = RetryPolicy {
            max_jitter: Duration::ZERO,
            ..Default::default()
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
    }
}
