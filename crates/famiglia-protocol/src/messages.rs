//! Request and response bodies exchanged over HTTP.
//!
//! Handlers deserialize requests into these types with `axum::Json` /
//! `axum::extract::Query`. Unknown JSON keys are ignored (serde's default),
//! so older clients sending extra fields keep working.

use serde::{Deserialize, Serialize};

use crate::{MissionId, Player, PlayerId, Visibility};

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

/// `POST /auth/login`. `username` is accepted as an alias for `email`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    pub password: String,
    /// Required on every login except the very first probe.
    #[serde(default)]
    pub role: Option<String>,
}

impl LoginRequest {
    /// The login identifier: `email` if present, else `username`.
    pub fn login(&self) -> Option<&str> {
        self.email
            .as_deref()
            .or(self.username.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// A player as shown to clients, tagged with whether it is the admin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub player: Player,
    pub is_admin: bool,
}

/// Reply to `POST /auth/login`.
///
/// On a first-login probe `is_first_login` is `true`, the tokens are empty
/// strings and `assigned_role` tells the client which role to confirm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub player: Option<ProfileView>,
    pub is_first_login: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_role: Option<String>,
}

/// `POST /auth/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: String,
}

/// `GET /auth/verify?token=...`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyQuery {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub player_id: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<Player>,
}

// ---------------------------------------------------------------------------
// Query strings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LimitQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DayQuery {
    #[serde(default)]
    pub day: Option<u32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SetDayQuery {
    pub day: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SetHourQuery {
    pub hour: u32,
}

// ---------------------------------------------------------------------------
// Missions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteMissionRequest {
    pub mission_id: MissionId,
    /// Admins may complete a mission on behalf of another player.
    #[serde(default)]
    pub player_id: Option<PlayerId>,
    #[serde(default)]
    pub completion_proof: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMissionRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reward_md: f64,
    #[serde(default)]
    pub reward_item: Option<String>,
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
    #[serde(default = "default_mission_type", rename = "type")]
    pub mission_type: String,
}

fn default_all() -> String {
    crate::ALL.to_string()
}

fn default_day() -> u32 {
    1
}

fn default_mission_type() -> String {
    "General".to_string()
}

// ---------------------------------------------------------------------------
// Trades and market
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferMoneyRequest {
    pub to_player_id: PlayerId,
    pub amount: f64,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOfferRequest {
    pub item_name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default = "default_quantity")]
    pub quantity_available: u32,
}

fn default_quantity() -> u32 {
    1
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMoneyRequest {
    pub player_id: PlayerId,
    /// Signed delta; the resulting balance is clamped at zero.
    pub amount: f64,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatsRequest {
    pub player_id: PlayerId,
    #[serde(default)]
    pub missions_completed: Option<u32>,
    #[serde(default)]
    pub puzzles_solved: Option<u32>,
    #[serde(default)]
    pub kills_made: Option<u32>,
    #[serde(default)]
    pub influence_points: Option<f64>,
    #[serde(default)]
    pub alive: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateItemsRequest {
    pub player_id: PlayerId,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishNewsRequest {
    pub title: String,
    pub message: String,
}

/// Body of the eliminate / revive endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRefRequest {
    pub player_id: PlayerId,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Body of `POST /admin/assign-role`. The player is looked up by email
/// because an unclaimed player has no id yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignRoleRequest {
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub family: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddPlayerRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub assigned_role: Option<String>,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub balance: f64,
}

/// Who a reminder email goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientGroup {
    /// Only the admin's own address.
    #[default]
    Test,
    /// Every player with an email address.
    All,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReminderRequest {
    #[serde(default)]
    pub recipient_type: RecipientGroup,
    #[serde(default)]
    pub blackmarket_time: Option<String>,
}
