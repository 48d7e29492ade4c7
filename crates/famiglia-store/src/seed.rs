//! Seed files for the in-memory backend.
//!
//! Player rows are usually exported from a spreadsheet, so the player
//! record decodes leniently: `alive` may be a bool, `"TRUE"`/`"FALSE"` or
//! a number, `items` may be an array or a JSON string holding one, and
//! numeric cells may arrive as strings. Everything is normalized into a
//! plain [`Player`] here, so nothing past this module sees the loose forms.

use std::path::Path;

use famiglia_protocol::{Mission, Offer, Player, PlayerId, Stats};
use serde::Deserialize;

use crate::StoreError;

/// The whole seed document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeedFile {
    pub players: Vec<PlayerRecord>,
    pub missions: Vec<Mission>,
    pub offers: Vec<Offer>,
}

/// Reads and parses a seed file.
pub async fn load_seed(path: impl AsRef<Path>) -> Result<SeedFile, StoreError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| StoreError::Seed(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&raw).map_err(|e| StoreError::Seed(format!("{}: {e}", path.display())))
}

// ---------------------------------------------------------------------------
// Loose cell values
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LooseBool {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl LooseBool {
    fn into_bool(self, default: bool) -> bool {
        match self {
            Self::Bool(b) => b,
            Self::Number(n) => n != 0.0,
            Self::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => true,
                "false" | "no" | "0" => false,
                _ => default,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LooseNumber {
    Number(f64),
    Text(String),
}

impl LooseNumber {
    fn as_f64(&self) -> f64 {
        match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse().unwrap_or(0.0),
        }
    }

    fn as_u32(&self) -> u32 {
        let n = self.as_f64();
        if n.is_finite() && n > 0.0 {
            n as u32
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LooseItems {
    List(Vec<String>),
    Encoded(String),
}

impl LooseItems {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::List(items) => items,
            Self::Encoded(s) if s.trim().is_empty() => Vec::new(),
            Self::Encoded(s) => serde_json::from_str(&s).unwrap_or_else(|_| {
                tracing::warn!(items = %s, "unreadable items cell, treating as empty");
                Vec::new()
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LooseId {
    Text(String),
    Number(u64),
}

impl LooseId {
    fn into_player_id(self) -> Option<PlayerId> {
        match self {
            Self::Text(s) if s.trim().is_empty() => None,
            Self::Text(s) => Some(PlayerId(s.trim().to_string())),
            Self::Number(n) => Some(PlayerId(n.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// PlayerRecord
// ---------------------------------------------------------------------------

/// A player row as it appears in a seed file.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerRecord {
    #[serde(default)]
    player_id: Option<LooseId>,
    #[serde(default)]
    name: String,
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    assigned_role: String,
    #[serde(default)]
    family: String,
    #[serde(default)]
    balance: Option<LooseNumber>,
    #[serde(default)]
    alive: Option<LooseBool>,
    #[serde(default)]
    missions_completed: Option<LooseNumber>,
    #[serde(default)]
    puzzles_solved: Option<LooseNumber>,
    #[serde(default)]
    kills_made: Option<LooseNumber>,
    #[serde(default)]
    influence_points: Option<LooseNumber>,
    #[serde(default)]
    trades_completed: Option<LooseNumber>,
    #[serde(default)]
    items: Option<LooseItems>,
    #[serde(default)]
    registered: Option<LooseBool>,
}

impl PlayerRecord {
    /// Normalizes the row into a [`Player`].
    ///
    /// Negative balances are floored at zero; a missing `alive` cell means
    /// alive. Any `individual_score` cell is ignored: the score is derived
    /// from balance and stats, and [`crate::MemoryStorage::from_seed`] sets
    /// it.
    pub fn into_player(self) -> Player {
        let u32_of = |v: &Option<LooseNumber>| v.as_ref().map_or(0, LooseNumber::as_u32);
        let f64_of = |v: &Option<LooseNumber>| v.as_ref().map_or(0.0, LooseNumber::as_f64);

        let balance = f64_of(&self.balance);
        Player {
            player_id: self.player_id.and_then(LooseId::into_player_id),
            name: self.name,
            email: self.email.trim().to_string(),
            password: self.password,
            role: self.role,
            assigned_role: self.assigned_role,
            family: self.family,
            balance: if balance.is_finite() { balance.max(0.0) } else { 0.0 },
            alive: self.alive.map_or(true, |v| v.into_bool(true)),
            stats: Stats {
                missions_completed: u32_of(&self.missions_completed),
                puzzles_solved: u32_of(&self.puzzles_solved),
                kills_made: u32_of(&self.kills_made),
                influence_points: f64_of(&self.influence_points),
                trades_completed: u32_of(&self.trades_completed),
            },
            individual_score: 0.0,
            items: self.items.map_or_else(Vec::new, LooseItems::into_vec),
            registered: self.registered.is_some_and(|v| v.into_bool(false)),
            version: 0,
        }
    }
}
