//! Player-facing reads: rosters, profiles, leaderboards, news.

use famiglia_protocol::{LeaderboardEntry, NewsItem, Player, PlayerId, ProfileView};
use famiglia_session::Identity;
use famiglia_store::{PlayerPatch, PlayerStore, Storage};
use serde::Serialize;
use tracing::info;

use crate::game::{require_admin, require_stored_player};
use crate::{Game, GameError, Notifier};

/// Result of a score recomputation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreUpdate {
    pub player_id: PlayerId,
    pub new_score: f64,
}

impl<S: Storage, N: Notifier> Game<S, N> {
    /// Every stored player.
    pub async fn players(&self) -> Result<Vec<Player>, GameError> {
        Ok(self.storage().players().list_all().await?)
    }

    /// One player. Players may read only themselves; the admin anyone.
    pub async fn player(&self, caller: &Identity, id: &PlayerId) -> Result<Player, GameError> {
        if !caller.is_admin() && caller.player_id() != *id {
            return Err(GameError::forbidden("players can only view their own record"));
        }
        self.require_player(id).await
    }

    /// The caller's profile, tagged with whether they are the admin.
    pub fn profile(&self, caller: &Identity) -> ProfileView {
        ProfileView {
            player: caller.profile().clone(),
            is_admin: caller.is_admin(),
        }
    }

    /// Living players, best score first, at most `limit` rows.
    pub async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, GameError> {
        let mut alive: Vec<Player> = self
            .storage()
            .players()
            .list_all()
            .await?
            .into_iter()
            .filter(|p| p.alive)
            .collect();
        alive.sort_by(|a, b| b.individual_score.total_cmp(&a.individual_score));
        Ok(alive.iter().take(limit).map(LeaderboardEntry::from).collect())
    }

    /// Recomputes and stores one player's score. Admin only.
    pub async fn update_score(
        &self,
        caller: &Identity,
        id: &PlayerId,
    ) -> Result<ScoreUpdate, GameError> {
        require_admin(caller)?;
        let player = self
            .mutate_player(id, |_| Ok(PlayerPatch::default()))
            .await?;
        Ok(ScoreUpdate {
            player_id: id.clone(),
            new_score: player.individual_score,
        })
    }

    /// Every retained news item, oldest first.
    pub async fn news_feed(&self) -> Vec<NewsItem> {
        self.news().list().await
    }

    /// The caller marks themselves eliminated. The admin cannot die.
    pub async fn mark_dead(&self, caller: &Identity) -> Result<Player, GameError> {
        let id = require_stored_player(caller, "be eliminated")?
            .player_id
            .clone()
            .ok_or_else(|| GameError::NotFound("player".into()))?;
        let player = self
            .mutate_player(&id, |_| {
                Ok(PlayerPatch {
                    alive: Some(false),
                    ..Default::default()
                })
            })
            .await?;
        info!(player_id = %id, "player marked themselves dead");
        Ok(player)
    }
}
