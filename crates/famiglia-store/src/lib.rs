//! Persistence for Famiglia.
//!
//! The game layer sees storage only through the store traits:
//!
//! ```text
//! Game rules → Storage (ports) → Resilient (timeout + retry) → MemoryStorage
//! ```
//!
//! - [`MemoryStorage`] keeps every record in process, behind `RwLock`s.
//! - [`Resilient`] decorates any backend with a per-call timeout and
//!   bounded retries of transient failures.
//! - [`SeedFile`] loads initial players, missions and offers from JSON.

mod error;
mod memory;
mod patch;
mod ports;
mod retry;
mod seed;

pub use error::StoreError;
pub use memory::{MemoryMissions, MemoryOffers, MemoryPlayers, MemoryStorage, MemoryTrades};
pub use patch::{MissionPatch, PlayerPatch};
pub use ports::{MissionStore, OfferStore, PlayerStore, Storage, TradeStore};
pub use retry::{
    Resilient, RetryPolicy, RetryingMissions, RetryingOffers, RetryingPlayers, RetryingTrades,
};
pub use seed::{PlayerRecord, SeedFile, load_seed};
