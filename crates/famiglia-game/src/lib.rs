//! Game rules for Famiglia.
//!
//! Everything here is independent of HTTP. The server crate resolves an
//! [`Identity`](famiglia_session::Identity) per request and calls into a
//! [`Game`], which talks to storage through the `famiglia-store` traits.
//!
//! # Key types
//!
//! - [`Game`]: the service holding storage, clock, game state, news and
//!   notifier, with one method per game operation.
//! - [`score::individual_score`]: the pure score formula.
//! - [`gates`]: pure predicates for mission unlock, mission visibility and
//!   market hours.
//! - [`Clock`]: injected time; [`FixedClock`] pins it in tests.
//! - [`Notifier`]: outbound reminders; [`LogNotifier`] logs them.

mod admin;
mod clock;
mod error;
pub mod families;
mod game;
pub mod gates;
mod market;
mod missions;
mod news;
mod notifier;
mod players;
pub mod score;
mod state;
mod trades;

pub use admin::{Dashboard, LifeUpdate, MoneyUpdate, ReminderKind, ReminderReport};
pub use clock::{Clock, FixedClock, GAME_OFFSET_SECS, SystemClock, game_offset, to_game_time};
pub use error::GameError;
pub use families::{FamilyMembers, MemberView};
pub use game::{CAS_RETRIES, Game};
pub use market::{OfferBoard, OfferView, PurchaseReceipt};
pub use missions::{CompletionReceipt, MissionList, TodayMissions};
pub use news::NewsBoard;
pub use notifier::{LogNotifier, Notification, Notifier, NotifyReport};
pub use players::ScoreUpdate;
pub use state::{GameSettings, GameState, GameStateHandle};
pub use trades::TransferReceipt;
