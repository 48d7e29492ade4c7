//! Storage ports: the traits every backend implements.
//!
//! The game rules only ever talk to these traits, never to a concrete
//! backend. The in-memory backend in [`crate::memory`] is what tests and
//! the default binary use; a spreadsheet or SQL adapter would implement the
//! same traits.
//!
//! # Why `impl Future + Send`?
//!
//! Handlers run on Tokio's multi-threaded runtime, so every future they
//! await must be `Send`. Spelling the bound out in the trait lets
//! implementors write plain `async fn` while generic callers still know the
//! returned future can cross threads.

use std::future::Future;

use famiglia_protocol::{Mission, MissionId, Offer, OfferId, Player, PlayerId, TradeRecord};

use crate::{MissionPatch, PlayerPatch, StoreError};

/// Player records, addressable by email (always) and id (once claimed).
pub trait PlayerStore: Send + Sync + 'static {
    fn get_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<Player>, StoreError>> + Send;

    fn get_by_id(
        &self,
        id: &PlayerId,
    ) -> impl Future<Output = Result<Option<Player>, StoreError>> + Send;

    /// Applies `patch` to the player with `id` and returns the new record.
    ///
    /// When `expected_version` is `Some`, the write only happens if the
    /// stored version still matches; otherwise it fails with
    /// [`StoreError::Conflict`] and nothing changes.
    fn update(
        &self,
        id: &PlayerId,
        patch: PlayerPatch,
        expected_version: Option<u64>,
    ) -> impl Future<Output = Result<Player, StoreError>> + Send;

    /// Applies `patch` to the player with `email`. Used before the player
    /// has an id (role assignment, first login).
    ///
    /// Same `expected_version` contract as [`PlayerStore::update`].
    fn update_by_email(
        &self,
        email: &str,
        patch: PlayerPatch,
        expected_version: Option<u64>,
    ) -> impl Future<Output = Result<Player, StoreError>> + Send;

    fn list_all(&self) -> impl Future<Output = Result<Vec<Player>, StoreError>> + Send;

    /// Adds a new player. Emails are unique.
    fn append(&self, player: Player) -> impl Future<Output = Result<Player, StoreError>> + Send;
}

/// Mission records.
pub trait MissionStore: Send + Sync + 'static {
    fn list_all(&self) -> impl Future<Output = Result<Vec<Mission>, StoreError>> + Send;

    fn get(
        &self,
        id: MissionId,
    ) -> impl Future<Output = Result<Option<Mission>, StoreError>> + Send;

    /// Same optimistic-concurrency contract as [`PlayerStore::update`].
    fn update(
        &self,
        id: MissionId,
        patch: MissionPatch,
        expected_version: Option<u64>,
    ) -> impl Future<Output = Result<Mission, StoreError>> + Send;

    /// Reopens a mission that `by` completed, clearing the completion.
    ///
    /// Only succeeds while the mission is still at `expected_version` and
    /// `completed_by` is `by`; otherwise fails with
    /// [`StoreError::Conflict`] and nothing changes. This is the one write
    /// allowed to move a mission back to `Available`.
    fn release(
        &self,
        id: MissionId,
        by: &PlayerId,
        expected_version: u64,
    ) -> impl Future<Output = Result<Mission, StoreError>> + Send;

    /// Stores a new mission under the next free id and returns it.
    fn append(&self, mission: Mission) -> impl Future<Output = Result<Mission, StoreError>> + Send;

    /// Removes every mission.
    fn clear(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Black market offers.
pub trait OfferStore: Send + Sync + 'static {
    fn list_all(&self) -> impl Future<Output = Result<Vec<Offer>, StoreError>> + Send;

    fn get(&self, id: OfferId) -> impl Future<Output = Result<Option<Offer>, StoreError>> + Send;

    /// Atomically takes `by` units out of stock and returns the offer.
    ///
    /// Fails with [`StoreError::InsufficientQuantity`] instead of letting
    /// the quantity go below zero, so concurrent buyers can't oversell.
    fn decrement_quantity(
        &self,
        id: OfferId,
        by: u32,
    ) -> impl Future<Output = Result<Offer, StoreError>> + Send;

    /// Puts `by` units back. Used to undo a decrement whose purchase failed.
    fn increment_quantity(
        &self,
        id: OfferId,
        by: u32,
    ) -> impl Future<Output = Result<Offer, StoreError>> + Send;

    /// Stores a new offer under the next free id and returns it.
    fn append(&self, offer: Offer) -> impl Future<Output = Result<Offer, StoreError>> + Send;

    fn delete(&self, id: OfferId) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// The public ledger of money transfers.
pub trait TradeStore: Send + Sync + 'static {
    /// Stores a trade under the next free id and returns it.
    fn append(
        &self,
        trade: TradeRecord,
    ) -> impl Future<Output = Result<TradeRecord, StoreError>> + Send;

    fn list_all(&self) -> impl Future<Output = Result<Vec<TradeRecord>, StoreError>> + Send;
}

/// A complete backend: one store of each kind.
///
/// Associated types (rather than trait objects) keep every call statically
/// dispatched, the same way a game plugs its types into the server.
pub trait Storage: Send + Sync + 'static {
    type Players: PlayerStore;
    type Missions: MissionStore;
    type Offers: OfferStore;
    type Trades: TradeStore;

    fn players(&self) -> &Self::Players;
    fn missions(&self) -> &Self::Missions;
    fn offers(&self) -> &Self::Offers;
    fn trades(&self) -> &Self::Trades;
}
