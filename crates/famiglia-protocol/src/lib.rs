//! Shared data for Famiglia.
//!
//! This crate defines the "nouns" every other layer speaks:
//!
//! - **Records** ([`Player`], [`Mission`], [`Offer`], [`TradeRecord`],
//!   [`NewsItem`]) — what the stores hold.
//! - **Aggregates** ([`FamilySummary`], [`LeaderboardEntry`]) — computed
//!   views over many records.
//! - **Messages** ([`LoginRequest`], [`LoginResponse`], ...) — HTTP bodies.
//! - **Errors** ([`ProtocolError`]) — unreadable wire values.
//!
//! ```text
//! HTTP (JSON) → Protocol (records, messages) → Session / Game
//! ```

mod error;
mod messages;
mod types;

pub use error::ProtocolError;
pub use messages::{
    AddPlayerRequest, AssignRoleRequest, CompleteMissionRequest,
    CreateMissionRequest, CreateOfferRequest, DayQuery, LimitQuery,
    LoginRequest, LoginResponse, PlayerRefRequest, ProfileView,
    PublishNewsRequest, RecipientGroup, RefreshRequest, RefreshResponse,
    ReminderRequest, SetDayQuery, SetHourQuery, TransferMoneyRequest,
    UpdateItemsRequest, UpdateMoneyRequest, UpdateStatsRequest, VerifyQuery,
    VerifyResponse,
};
pub use types::{
    ALL, DON_ROLE, FamilySummary, GODFATHER_ROLE, LeaderboardEntry, Mission,
    MissionId, MissionStatus, NewsItem, Offer, OfferId, Player, PlayerId,
    Stats, TradeRecord, Visibility,
};
