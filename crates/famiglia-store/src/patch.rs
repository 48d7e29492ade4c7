//! Partial updates ("field maps") for stored records.
//!
//! A patch names only the fields it changes; `None` leaves a field alone.
//! Patches deserialize with `#[serde(default)]`, and serde ignores unknown
//! keys, so a JSON field map with keys outside the schema simply has no
//! effect on those keys.

use chrono::{DateTime, Utc};
use famiglia_protocol::{Mission, MissionStatus, Player, PlayerId};
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Changes to apply to a [`Player`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerPatch {
    pub player_id: Option<PlayerId>,
    pub name: Option<String>,
    pub role: Option<String>,
    pub assigned_role: Option<String>,
    pub family: Option<String>,
    pub balance: Option<f64>,
    pub alive: Option<bool>,
    pub missions_completed: Option<u32>,
    pub puzzles_solved: Option<u32>,
    pub kills_made: Option<u32>,
    pub influence_points: Option<f64>,
    pub trades_completed: Option<u32>,
    pub individual_score: Option<f64>,
    pub items: Option<Vec<String>>,
    pub registered: Option<bool>,
}

impl PlayerPatch {
    /// Checks record invariants without touching the player.
    pub fn validate(&self) -> Result<(), StoreError> {
        if let Some(balance) = self.balance {
            if !balance.is_finite() || balance < 0.0 {
                return Err(StoreError::Rejected(format!(
                    "balance must be a non-negative number, got {balance}"
                )));
            }
        }
        if let Some(points) = self.influence_points {
            if !points.is_finite() {
                return Err(StoreError::Rejected(
                    "influence_points must be finite".into(),
                ));
            }
        }
        Ok(())
    }

    /// Copies every `Some` field onto `player`.
    ///
    /// Call [`validate`](Self::validate) first; `apply` itself never fails.
    pub fn apply(self, player: &mut Player) {
        if let Some(v) = self.player_id {
            player.player_id = Some(v);
        }
        if let Some(v) = self.name {
            player.name = v;
        }
        if let Some(v) = self.role {
            player.role = v;
        }
        if let Some(v) = self.assigned_role {
            player.assigned_role = v;
        }
        if let Some(v) = self.family {
            player.family = v;
        }
        if let Some(v) = self.balance {
            player.balance = v;
        }
        if let Some(v) = self.alive {
            player.alive = v;
        }
        if let Some(v) = self.missions_completed {
            player.stats.missions_completed = v;
        }
        if let Some(v) = self.puzzles_solved {
            player.stats.puzzles_solved = v;
        }
        if let Some(v) = self.kills_made {
            player.stats.kills_made = v;
        }
        if let Some(v) = self.influence_points {
            player.stats.influence_points = v;
        }
        if let Some(v) = self.trades_completed {
            player.stats.trades_completed = v;
        }
        if let Some(v) = self.individual_score {
            player.individual_score = v;
        }
        if let Some(v) = self.items {
            player.items = v;
        }
        if let Some(v) = self.registered {
            player.registered = v;
        }
    }
}

/// Changes to apply to a [`Mission`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub reward_md: Option<f64>,
    pub reward_item: Option<String>,
    pub day: Option<u32>,
    pub status: Option<MissionStatus>,
    pub completed_by: Option<PlayerId>,
    pub completion_time: Option<DateTime<Utc>>,
}

impl MissionPatch {
    /// Rejects status changes the mission lifecycle doesn't allow.
    pub fn validate_against(&self, mission: &Mission) -> Result<(), StoreError> {
        if let Some(target) = self.status {
            if target != mission.status && !mission.status.can_transition_to(target) {
                return Err(StoreError::Rejected(format!(
                    "mission {} cannot move from {} to {}",
                    mission.mission_id, mission.status, target
                )));
            }
        }
        Ok(())
    }

    pub fn apply(self, mission: &mut Mission) {
        if let Some(v) = self.title {
            mission.title = v;
        }
        if let Some(v) = self.description {
            mission.description = v;
        }
        if let Some(v) = self.reward_md {
            mission.reward_md = v;
        }
        if let Some(v) = self.reward_item {
            mission.reward_item = Some(v);
        }
        if let Some(v) = self.day {
            mission.day = v;
        }
        if let Some(v) = self.status {
            mission.status = v;
        }
        if let Some(v) = self.completed_by {
            mission.completed_by = Some(v);
        }
        if let Some(v) = self.completion_time {
            mission.completion_time = Some(v);
        }
    }
}
