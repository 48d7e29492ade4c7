//! In-process backend built on `tokio::sync::RwLock`.
//!
//! Every write takes the write lock for the whole read-check-modify step,
//! so the version checks and the stock decrement are atomic with respect
//! to other callers. Data lives only as long as the process.

use std::collections::BTreeMap;

use famiglia_protocol::{
    Mission, MissionId, MissionStatus, Offer, OfferId, Player, PlayerId, TradeRecord,
};
use tokio::sync::RwLock;

use crate::{
    MissionPatch, MissionStore, OfferStore, PlayerPatch, PlayerStore, SeedFile, Storage,
    StoreError, TradeStore,
};

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// Players kept in insertion order, like rows in a sheet.
#[derive(Debug, Default)]
pub struct MemoryPlayers {
    rows: RwLock<Vec<Player>>,
}

impl MemoryPlayers {
    fn check_version(player: &Player, expected: Option<u64>) -> Result<(), StoreError> {
        match expected {
            Some(expected) if expected != player.version => Err(StoreError::Conflict {
                entity: format!("player {}", player.email),
                expected,
                found: player.version,
            }),
            _ => Ok(()),
        }
    }

    fn write(player: &mut Player, patch: PlayerPatch) -> Result<Player, StoreError> {
        patch.validate()?;
        patch.apply(player);
        player.version += 1;
        Ok(player.clone())
    }
}

impl PlayerStore for MemoryPlayers {
    async fn get_by_email(&self, email: &str) -> Result<Option<Player>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|p| p.email == email).cloned())
    }

    async fn get_by_id(&self, id: &PlayerId) -> Result<Option<Player>, StoreError> {
        if id.as_str().is_empty() {
            return Ok(None);
        }
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .find(|p| p.player_id.as_ref() == Some(id))
            .cloned())
    }

    async fn update(
        &self,
        id: &PlayerId,
        patch: PlayerPatch,
        expected_version: Option<u64>,
    ) -> Result<Player, StoreError> {
        let mut rows = self.rows.write().await;
        let player = rows
            .iter_mut()
            .find(|p| p.player_id.as_ref() == Some(id))
            .ok_or_else(|| StoreError::NotFound(format!("player {id}")))?;
        Self::check_version(player, expected_version)?;
        Self::write(player, patch)
    }

    async fn update_by_email(
        &self,
        email: &str,
        patch: PlayerPatch,
        expected_version: Option<u64>,
    ) -> Result<Player, StoreError> {
        let mut rows = self.rows.write().await;
        let player = rows
            .iter_mut()
            .find(|p| p.email == email)
            .ok_or_else(|| StoreError::NotFound(format!("player {email}")))?;
        Self::check_version(player, expected_version)?;
        Self::write(player, patch)
    }

    async fn list_all(&self) -> Result<Vec<Player>, StoreError> {
        Ok(self.rows.read().await.clone())
    }

    async fn append(&self, mut player: Player) -> Result<Player, StoreError> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|p| p.email == player.email) {
            return Err(StoreError::Duplicate(format!("player email {}", player.email)));
        }
        if player.balance < 0.0 {
            return Err(StoreError::Rejected("balance must be non-negative".into()));
        }
        player.version = 0;
        rows.push(player.clone());
        Ok(player)
    }
}

// ---------------------------------------------------------------------------
// Missions
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryMissions {
    rows: RwLock<BTreeMap<MissionId, Mission>>,
}

impl MissionStore for MemoryMissions {
    async fn list_all(&self) -> Result<Vec<Mission>, StoreError> {
        Ok(self.rows.read().await.values().cloned().collect())
    }

    async fn get(&self, id: MissionId) -> Result<Option<Mission>, StoreError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn update(
        &self,
        id: MissionId,
        patch: MissionPatch,
        expected_version: Option<u64>,
    ) -> Result<Mission, StoreError> {
        let mut rows = self.rows.write().await;
        let mission = rows
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("mission {id}")))?;
        if let Some(expected) = expected_version {
            if expected != mission.version {
                return Err(StoreError::Conflict {
                    entity: format!("mission {id}"),
                    expected,
                    found: mission.version,
                });
            }
        }
        patch.validate_against(mission)?;
        patch.apply(mission);
        mission.version += 1;
        Ok(mission.clone())
    }

    async fn release(
        &self,
        id: MissionId,
        by: &PlayerId,
        expected_version: u64,
    ) -> Result<Mission, StoreError> {
        let mut rows = self.rows.write().await;
        let mission = rows
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("mission {id}")))?;
        if mission.version != expected_version || mission.completed_by.as_ref() != Some(by) {
            return Err(StoreError::Conflict {
                entity: format!("mission {id}"),
                expected: expected_version,
                found: mission.version,
            });
        }
        mission.status = MissionStatus::Available;
        mission.completed_by = None;
        mission.completion_time = None;
        mission.version += 1;
        Ok(mission.clone())
    }

    async fn append(&self, mut mission: Mission) -> Result<Mission, StoreError> {
        let mut rows = self.rows.write().await;
        let next = rows.keys().next_back().map_or(1, |id| id.0 + 1);
        mission.mission_id = MissionId(next);
        mission.version = 0;
        rows.insert(mission.mission_id, mission.clone());
        Ok(mission)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.rows.write().await.clear();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Offers
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryOffers {
    rows: RwLock<BTreeMap<OfferId, Offer>>,
}

impl OfferStore for MemoryOffers {
    async fn list_all(&self) -> Result<Vec<Offer>, StoreError> {
        Ok(self.rows.read().await.values().cloned().collect())
    }

    async fn get(&self, id: OfferId) -> Result<Option<Offer>, StoreError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn decrement_quantity(&self, id: OfferId, by: u32) -> Result<Offer, StoreError> {
        let mut rows = self.rows.write().await;
        let offer = rows
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("offer {id}")))?;
        offer.quantity_available = offer.quantity_available.checked_sub(by).ok_or(
            StoreError::InsufficientQuantity {
                offer: id.to_string(),
                available: offer.quantity_available,
            },
        )?;
        Ok(offer.clone())
    }

    async fn increment_quantity(&self, id: OfferId, by: u32) -> Result<Offer, StoreError> {
        let mut rows = self.rows.write().await;
        let offer = rows
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("offer {id}")))?;
        offer.quantity_available = offer.quantity_available.saturating_add(by);
        Ok(offer.clone())
    }

    async fn append(&self, mut offer: Offer) -> Result<Offer, StoreError> {
        let mut rows = self.rows.write().await;
        let next = rows.keys().next_back().map_or(1, |id| id.0 + 1);
        offer.offer_id = OfferId(next);
        rows.insert(offer.offer_id, offer.clone());
        Ok(offer)
    }

    async fn delete(&self, id: OfferId) -> Result<(), StoreError> {
        self.rows
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("offer {id}")))
    }
}

// ---------------------------------------------------------------------------
// Trades
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryTrades {
    rows: RwLock<Vec<TradeRecord>>,
}

impl TradeStore for MemoryTrades {
    async fn append(&self, mut trade: TradeRecord) -> Result<TradeRecord, StoreError> {
        let mut rows = self.rows.write().await;
        trade.trade_id = rows.len() as u64 + 1;
        rows.push(trade.clone());
        Ok(trade)
    }

    async fn list_all(&self) -> Result<Vec<TradeRecord>, StoreError> {
        Ok(self.rows.read().await.clone())
    }
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// All four in-memory stores bundled as one [`Storage`].
#[derive(Debug, Default)]
pub struct MemoryStorage {
    players: MemoryPlayers,
    missions: MemoryMissions,
    offers: MemoryOffers,
    trades: MemoryTrades,
}

impl MemoryStorage {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend pre-filled from a seed file.
    ///
    /// Mission and offer ids from the seed are kept as given; players must
    /// have unique emails. Every player's `individual_score` is set by
    /// `score` over the normalized record, whatever the seed says.
    pub async fn from_seed(
        seed: SeedFile,
        score: impl Fn(&Player) -> f64,
    ) -> Result<Self, StoreError> {
        let storage = Self::new();
        for record in seed.players {
            let mut player = record.into_player();
            player.individual_score = score(&player);
            storage.players.append(player).await?;
        }
        {
            let mut missions = storage.missions.rows.write().await;
            for mission in seed.missions {
                if missions.insert(mission.mission_id, mission.clone()).is_some() {
                    return Err(StoreError::Duplicate(format!("mission {}", mission.mission_id)));
                }
            }
        }
        {
            let mut offers = storage.offers.rows.write().await;
            for offer in seed.offers {
                if offers.insert(offer.offer_id, offer.clone()).is_some() {
                    return Err(StoreError::Duplicate(format!("offer {}", offer.offer_id)));
                }
            }
        }
        tracing::info!(
            players = storage.players.rows.read().await.len(),
            missions = storage.missions.rows.read().await.len(),
            offers = storage.offers.rows.read().await.len(),
            "in-memory store seeded"
        );
        Ok(storage)
    }
}

impl Storage for MemoryStorage {
    type Players = MemoryPlayers;
    type Missions = MemoryMissions;
    type Offers = MemoryOffers;
    type Trades = MemoryTrades;

    fn players(&self) -> &MemoryPlayers {
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
