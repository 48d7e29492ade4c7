//! Admin-only operations: direct edits, roster management, game control,
//! announcements and reminders.
//!
//! Every operation here checks the caller first and fails with
//! `Forbidden` for anyone but the admin.

use famiglia_protocol::{
    AddPlayerRequest, AssignRoleRequest, NewsItem, Player, PlayerId, PlayerRefRequest,
    PublishNewsRequest, RecipientGroup, ReminderRequest, UpdateItemsRequest, UpdateMoneyRequest,
    UpdateStatsRequest,
};
use famiglia_session::Identity;
use famiglia_store::{MissionStore, OfferStore, PlayerPatch, PlayerStore, Storage, StoreError};
use serde::Serialize;
use tracing::{info, warn};

use crate::game::require_admin;
use crate::{Game, GameError, GameState, Notification, Notifier, NotifyReport, score};

/// Result of a money edit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoneyUpdate {
    pub player_id: PlayerId,
    pub player_name: String,
    pub old_balance: f64,
    pub new_balance: f64,
    pub change: f64,
    pub reason: Option<String>,
    pub new_score: f64,
}

/// Result of an elimination or revival.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifeUpdate {
    pub player_id: PlayerId,
    pub player_name: String,
    pub alive: bool,
    pub reason: Option<String>,
}

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub total_players: usize,
    pub alive_players: usize,
    pub eliminated_players: usize,
    pub unclaimed_players: usize,
    pub total_money: f64,
    pub total_missions: usize,
    pub completed_missions: usize,
    pub total_offers: usize,
    pub families: usize,
    pub game_state: GameState,
}

/// Which reminder to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderKind {
    DayStart,
    MissionUnlock,
    Blackmarket,
}

/// Result of a reminder send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderReport {
    #[serde(flatten)]
    pub report: NotifyReport,
    pub recipient_type: RecipientGroup,
}

impl<S: Storage, N: Notifier> Game<S, N> {
    // -----------------------------------------------------------------------
    // Direct edits
    // -----------------------------------------------------------------------

    /// Adds a signed amount to a balance. The result never goes below 0.
    pub async fn update_money(
        &self,
        caller: &Identity,
        req: UpdateMoneyRequest,
    ) -> Result<MoneyUpdate, GameError> {
        require_admin(caller)?;
        if !req.amount.is_finite() {
            return Err(GameError::InvalidRequest("amount must be a number".into()));
        }
        let mut old_balance = 0.0;
        let player = self
            .mutate_player(&req.player_id, |p| {
                old_balance = p.balance;
                Ok(PlayerPatch {
                    balance: Some((p.balance + req.amount).max(0.0)),
                    ..Default::default()
                })
            })
            .await?;
        info!(
            player_id = %req.player_id,
            old_balance,
            new_balance = player.balance,
            reason = req.reason.as_deref().unwrap_or(""),
            "admin updated money"
        );
        Ok(MoneyUpdate {
            player_id: req.player_id,
            player_name: player.name,
            old_balance,
            new_balance: player.balance,
            change: req.amount,
            reason: req.reason,
            new_score: player.individual_score,
        })
    }

    /// Overwrites the given stats. Omitted fields are left alone.
    pub async fn update_stats(
        &self,
        caller: &Identity,
        req: UpdateStatsRequest,
    ) -> Result<Player, GameError> {
        require_admin(caller)?;
        if req.influence_points.is_some_and(|v| !v.is_finite()) {
            return Err(GameError::InvalidRequest(
                "influence_points must be a number".into(),
            ));
        }
        let patch = PlayerPatch {
            missions_completed: req.missions_completed,
            puzzles_solved: req.puzzles_solved,
            kills_made: req.kills_made,
            influence_points: req.influence_points,
            alive: req.alive,
            ..Default::default()
        };
        let player = self
            .mutate_player(&req.player_id, |_| Ok(patch.clone()))
            .await?;
        info!(player_id = %req.player_id, score = player.individual_score, "admin updated stats");
        Ok(player)
    }

    /// Replaces a player's inventory.
    pub async fn update_items(
        &self,
        caller: &Identity,
        req: UpdateItemsRequest,
    ) -> Result<Player, GameError> {
        require_admin(caller)?;
        let items: Vec<String> = req
            .items
            .into_iter()
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty())
            .collect();
        let player = self
            .mutate_player(&req.player_id, |_| {
                Ok(PlayerPatch {
                    items: Some(items.clone()),
                    ..Default::default()
                })
            })
            .await?;
        info!(player_id = %req.player_id, items = player.items.len(), "admin updated items");
        Ok(player)
    }

    // -----------------------------------------------------------------------
    // Roster
    // -----------------------------------------------------------------------

    pub async fn eliminate_player(
        &self,
        caller: &Identity,
        req: PlayerRefRequest,
    ) -> Result<LifeUpdate, GameError> {
        self.set_alive(caller, req, false).await
    }

    pub async fn revive_player(
        &self,
        caller: &Identity,
        req: PlayerRefRequest,
    ) -> Result<LifeUpdate, GameError> {
        self.set_alive(caller, req, true).await
    }

    async fn set_alive(
        &self,
        caller: &Identity,
        req: PlayerRefRequest,
        alive: bool,
    ) -> Result<LifeUpdate, GameError> {
        require_admin(caller)?;
        let player = self
            .mutate_player(&req.player_id, |_| {
                Ok(PlayerPatch {
                    alive: Some(alive),
                    ..Default::default()
                })
            })
            .await?;
        info!(player_id = %req.player_id, alive, "admin changed player life state");
        Ok(LifeUpdate {
            player_id: req.player_id,
            player_name: player.name,
            alive,
            reason: req.reason,
        })
    }

    /// Adds a new, unclaimed player. Emails are unique.
    pub async fn add_player(
        &self,
        caller: &Identity,
        req: AddPlayerRequest,
    ) -> Result<Player, GameError> {
        require_admin(caller)?;
        let email = req.email.trim();
        if email.is_empty() || req.password.is_empty() {
            return Err(GameError::InvalidRequest(
                "email and password are required".into(),
            ));
        }
        if !req.balance.is_finite() || req.balance < 0.0 {
            return Err(GameError::InvalidRequest(
                "balance must be a non-negative number".into(),
            ));
        }
        let mut player = Player::new(req.name.trim(), email, &req.password);
        player.assigned_role = req.assigned_role.unwrap_or_default();
        player.family = req.family.unwrap_or_default();
        player.balance = req.balance;
        player.individual_score = score::rescore(&player);

        let player = self
            .storage()
            .players()
            .append(player)
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(_) => {
                    GameError::InvalidRequest(format!("a player with email {email} already exists"))
                }
                other => other.into(),
            })?;
        info!(email = %player.email, "admin added player");
        Ok(player)
    }

    /// Assigns a role (and optionally a family) to a player by email.
    ///
    /// Sets both the confirmed and the assigned role, and empties the
    /// inventory so the player starts their new role fresh.
    pub async fn assign_role(
        &self,
        caller: &Identity,
        req: AssignRoleRequest,
    ) -> Result<Player, GameError> {
        require_admin(caller)?;
        let role = req.role.trim();
        if role.is_empty() {
            return Err(GameError::InvalidRequest("role must not be empty".into()));
        }
        let patch = PlayerPatch {
            role: Some(role.to_string()),
            assigned_role: Some(role.to_string()),
            family: req.family.map(|f| f.trim().to_string()),
            items: Some(Vec::new()),
            ..Default::default()
        };
        let player = self
            .storage()
            .players()
            .update_by_email(&req.email, patch, None)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => GameError::NotFound(format!("player {}", req.email)),
                other => other.into(),
            })?;
        info!(email = %req.email, role, family = %player.family, "admin assigned role");
        Ok(player)
    }

    // -----------------------------------------------------------------------
    // News and overview
    // -----------------------------------------------------------------------

    pub async fn publish_news(
        &self,
        caller: &Identity,
        req: PublishNewsRequest,
    ) -> Result<NewsItem, GameError> {
        require_admin(caller)?;
        if req.title.trim().is_empty() {
            return Err(GameError::InvalidRequest("title must not be empty".into()));
        }
        Ok(self.news().publish(&req.title, &req.message, self.now()).await)
    }

    pub async fn dashboard(&self, caller: &Identity) -> Result<Dashboard, GameError> {
        require_admin(caller)?;
        let players = self.storage().players().list_all().await?;
        let missions = self.storage().missions().list_all().await?;
        let offers = self.storage().offers().list_all().await?;

        let alive_players = players.iter().filter(|p| p.alive).count();
        Ok(Dashboard {
            total_players: players.len(),
            alive_players,
            eliminated_players: players.len() - alive_players,
            unclaimed_players: players.iter().filter(|p| !p.is_claimed()).count(),
            total_money: players.iter().map(|p| p.balance).sum(),
            total_missions: missions.len(),
            completed_missions: missions.iter().filter(|m| m.status.is_completed()).count(),
            total_offers: offers.len(),
            families: crate::families::aggregate(&players).len(),
            game_state: self.state().get().await,
        })
    }

    // -----------------------------------------------------------------------
    // Game control
    // -----------------------------------------------------------------------

    pub async fn clear_missions(&self, caller: &Identity) -> Result<(), GameError> {
        require_admin(caller)?;
        self.storage().missions().clear().await?;
        warn!("all missions cleared");
        Ok(())
    }

    pub async fn game_state(&self, caller: &Identity) -> Result<GameState, GameError> {
        require_admin(caller)?;
        Ok(self.state().get().await)
    }

    pub async fn set_game_day(&self, caller: &Identity, day: u32) -> Result<GameState, GameError> {
        require_admin(caller)?;
        self.state().set_day(day).await
    }

    pub async fn set_unlock_hour(
        &self,
        caller: &Identity,
        hour: u32,
    ) -> Result<GameState, GameError> {
        require_admin(caller)?;
        self.state().set_unlock_hour(hour).await
    }

    // -----------------------------------------------------------------------
    // Reminders
    // -----------------------------------------------------------------------

    /// Sends a reminder to the test address or to every player.
    ///
    /// A send that reaches nobody comes back with `success: false`; it is
    /// not an error.
    pub async fn send_reminder(
        &self,
        caller: &Identity,
        kind: ReminderKind,
        req: ReminderRequest,
    ) -> Result<ReminderReport, GameError> {
        require_admin(caller)?;
        let state = self.state().get().await;
        let notification = match kind {
            ReminderKind::DayStart => Notification::DayStart {
                day: state.current_day,
            },
            ReminderKind::MissionUnlock => Notification::MissionUnlock {
                day: state.current_day,
                unlock_hour: state.unlock_hour,
            },
            ReminderKind::Blackmarket => Notification::Blackmarket {
                open_time: req
                    .blackmarket_time
                    .unwrap_or_else(|| "11:11 PM IST".to_string()),
            },
        };
        let recipients = self.reminder_recipients(req.recipient_type).await?;
        let report = self.notifier().send(&notification, &recipients).await;
        if !report.success {
            warn!(%notification, message = %report.message, "reminder not delivered");
        }
        Ok(ReminderReport {
            report,
            recipient_type: req.recipient_type,
        })
    }

    async fn reminder_recipients(&self, group: RecipientGroup) -> Result<Vec<String>, GameError> {
        match group {
            RecipientGroup::Test => Ok(vec![self.settings().test_recipient.clone()]),
            RecipientGroup::All => Ok(self
                .storage()
                .players()
                .list_all()
                .await?
                .into_iter()
                .map(|p| p.email)
                .filter(|e| !e.is_empty())
                .collect()),
        }
    }
}
