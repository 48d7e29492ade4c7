//! Core records shared by every layer of Famiglia.
//!
//! These are the structures that the stores hold, the game rules mutate,
//! and the HTTP layer serializes back to clients. Nothing in here talks to
//! a network or a database; it is plain data plus a few predicates.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Role given to the administrator identity.
pub const GODFATHER_ROLE: &str = "Godfather";

/// Role of a family's head. Dons may create missions for their own family.
pub const DON_ROLE: &str = "Don";

/// Wildcard used by missions for "any family" / "any role".
pub const ALL: &str = "all";

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A stable player identifier (a UUID string), generated on first login.
///
/// Newtype wrapper so a player id can't be mixed up with an email or a
/// family name, even though all three are strings underneath.
/// `#[serde(transparent)]` serializes it as the bare string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A unique identifier for a mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MissionId(pub u64);

impl fmt::Display for MissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M-{}", self.0)
    }
}

/// A unique identifier for a black market offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OfferId(pub u64);

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "O-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// Counters that feed the individual score.
///
/// Every field defaults to zero so a record that never saw a stat is
/// scored as if the stat were zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub missions_completed: u32,
    pub puzzles_solved: u32,
    pub kills_made: u32,
    pub influence_points: f64,
    pub trades_completed: u32,
}

/// A player record: identity, onboarding state, and game state.
///
/// `player_id` stays `None` until the first login completes; until then the
/// record is addressed by `email`. The password is never serialized back
/// out, only read in (seed files, admin imports).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    #[serde(default)]
    pub player_id: Option<PlayerId>,
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    /// Confirmed role, set when the player claims their identity.
    #[serde(default)]
    pub role: String,
    /// The role an admin pre-assigned. Empty means "pending approval".
    #[serde(default)]
    pub assigned_role: String,
    /// Empty string means unaffiliated.
    #[serde(default)]
    pub family: String,
    #[serde(default)]
    pub balance: f64,
    #[serde(default = "default_alive")]
    pub alive: bool,
    #[serde(flatten)]
    pub stats: Stats,
    /// Projection of `balance` and `stats`; recomputed after mutations.
    #[serde(default)]
    pub individual_score: f64,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub registered: bool,
    /// Optimistic-concurrency token, bumped by the store on every write.
    #[serde(default)]
    pub version: u64,
}

fn default_alive() -> bool {
    true
}

impl Player {
    /// Creates an unclaimed, unassigned player with the given login.
    pub fn new(name: &str, email: &str, password: &str) -> Self {
        Self {
            player_id: None,
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: String::new(),
            assigned_role: String::new(),
            family: String::new(),
            balance: 0.0,
            alive: true,
            stats: Stats::default(),
            individual_score: 0.0,
            items: Vec::new(),
            registered: false,
            version: 0,
        }
    }

    /// Returns `true` once the player has a generated identifier.
    pub fn is_claimed(&self) -> bool {
        self.player_id
            .as_ref()
            .is_some_and(|id| !id.as_str().is_empty())
    }

    /// Returns `true` if this player heads their family.
    pub fn is_don(&self) -> bool {
        let role = if self.role.is_empty() {
            &self.assigned_role
        } else {
            &self.role
        };
        role.eq_ignore_ascii_case(DON_ROLE)
    }

    /// Returns `true` if the player belongs to a family.
    pub fn has_family(&self) -> bool {
        !self.family.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Missions
// ---------------------------------------------------------------------------

/// Who may see a mission.
///
/// Serialized lowercase. Decoding is case-insensitive, since missions are
/// typed in by hand ("Family", "PUBLIC").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Visibility {
    /// Gated by `assigned_family` and `assigned_role` (either may be "all").
    #[default]
    Public,
    /// Only the player named in `assigned_to`.
    Private,
    /// Every member of `assigned_family`, whatever their role.
    Family,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Private => write!(f, "private"),
            Self::Family => write!(f, "family"),
        }
    }
}

impl FromStr for Visibility {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            "family" => Ok(Self::Family),
            other => Err(ProtocolError::InvalidValue {
                field: "visibility",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Visibility {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Lifecycle of a mission. The only transition is `Available → Completed`.
///
/// ```text
/// Available ──(complete)──→ Completed
/// ```
///
/// Older sheets wrote "active" for open missions, so it decodes as
/// `Available`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionStatus {
    #[default]
    #[serde(alias = "active")]
    Available,
    Completed,
}

impl MissionStatus {
    /// Returns the next state, or `None` if this state is terminal.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Available => Some(Self::Completed),
            Self::Completed => None,
        }
    }

    /// Returns `true` if moving to `target` is a valid transition.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }

    pub fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => write!(f, "available"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// A mission players can complete for a reward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub mission_id: MissionId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_mission_type", rename = "type")]
    pub mission_type: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default = "default_all")]
    pub assigned_family: String,
    #[serde(default = "default_all")]
    pub assigned_role: String,
    #[serde(default)]
    pub assigned_to: Option<PlayerId>,
    #[serde(default = "default_day")]
    pub day: u32,
    #[serde(default)]
    pub status: MissionStatus,
    #[serde(default)]
    pub reward_md: f64,
    #[serde(default)]
    pub reward_item: Option<String>,
    #[serde(default)]
    pub completed_by: Option<PlayerId>,
    #[serde(default)]
    pub completion_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub version: u64,
}

fn default_mission_type() -> String {
    "General".to_string()
}

fn default_all() -> String {
    ALL.to_string()
}

fn default_day() -> u32 {
    1
}

// ---------------------------------------------------------------------------
// Black market
// ---------------------------------------------------------------------------

/// An item for sale on the black market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub offer_id: OfferId,
    pub item_name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub quantity_available: u32,
}

impl Offer {
    pub fn in_stock(&self) -> bool {
        self.quantity_available > 0
    }
}

// ---------------------------------------------------------------------------
// Ledger and announcements
// ---------------------------------------------------------------------------

/// One money transfer between two players.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub trade_id: u64,
    pub from_player: PlayerId,
    pub to_player: PlayerId,
    pub amount: f64,
    pub item: String,
    #[serde(default)]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl TradeRecord {
    /// Returns `true` if `player` sent or received this trade.
    pub fn involves(&self, player: &PlayerId) -> bool {
        &self.from_player == player || &self.to_player == player
    }
}

/// An announcement published by the admin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: u64,
    pub title: String,
    pub message: String,
    pub published_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// Statistics for one family, computed from its members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilySummary {
    pub family_name: String,
    /// Name of the member whose role is Don, empty if none.
    pub don: String,
    pub total_money: f64,
    pub members: usize,
    pub kills: u32,
    pub missions_completed: u32,
}

/// One row of the player leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub player_id: Option<PlayerId>,
    pub name: String,
    pub family: String,
    pub individual_score: f64,
    pub money: f64,
    pub missions_completed: u32,
    pub kills_made: u32,
}

impl From<&Player> for LeaderboardEntry {
    fn from(p: &Player) -> Self {
        Self {
            player_id: p.player_id.clone(),
            name: p.name.clone(),
            family: p.family.clone(),
            individual_score: p.individual_score,
            money: p.balance,
            missions_completed: p.stats.missions_completed,
            kills_made: p.stats.kills_made,
        }
    }
}
