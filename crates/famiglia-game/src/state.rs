//! Admin-controlled game progress: which day it is and when missions
//! unlock.
//!
//! Lives in process behind a `RwLock` and is passed explicitly to the
//! gates that need it. Restarting the server resets it to the configured
//! start values.

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::GameError;

// ---------------------------------------------------------------------------
// GameSettings
// ---------------------------------------------------------------------------

/// Startup configuration for the game rules.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSettings {
    /// Game day at startup. Default: 1.
    pub start_day: u32,
    /// Local hour (0–23) at which missions unlock. Default: 9.
    pub unlock_hour: u32,
    /// How many news items are kept. Default: 100.
    pub news_capacity: usize,
    /// Where "test" reminder emails go.
    pub test_recipient: String,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            start_day: 1,
            unlock_hour: 9,
            news_capacity: 100,
            test_recipient: "godfather@famiglia.local".to_string(),
        }
    }
}

impl GameSettings {
    /// Clamp out-of-range values.
    ///
    /// - `start_day` at least 1.
    /// - `unlock_hour` at most 23.
    /// - `news_capacity` at least 1.
    pub fn validated(mut self) -> Self {
        if self.start_day == 0 {
            warn!("start_day 0 is not a game day, using 1");
            self.start_day = 1;
        }
        if self.unlock_hour > 23 {
            warn!(hour = self.unlock_hour, "unlock_hour out of range, clamping to 23");
            self.unlock_hour = 23;
        }
        self.news_capacity = self.news_capacity.max(1);
        self
    }
}

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// A snapshot of the game progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub current_day: u32,
    #[serde(rename = "mission_unlock_hour")]
    pub unlock_hour: u32,
}

/// Shared, mutable [`GameState`].
#[derive(Debug)]
pub struct GameStateHandle {
    inner: RwLock<GameState>,
}

impl GameStateHandle {
    pub fn new(settings: &GameSettings) -> Self {
        Self {
            inner: RwLock::new(GameState {
                current_day: settings.start_day,
                unlock_hour: settings.unlock_hour,
            }),
        }
    }

    pub async fn get(&self) -> GameState {
        *self.inner.read().await
    }

    /// Sets the current game day. Days start at 1.
    pub async fn set_day(&self, day: u32) -> Result<GameState, GameError> {
        if day == 0 {
            return Err(GameError::InvalidRequest("day must be at least 1".into()));
        }
        let mut state = self.inner.write().await;
        state.current_day = day;
        info!(day, "game day set");
        Ok(*state)
    }

    /// Sets the mission unlock hour (0–23).
    pub async fn set_unlock_hour(&self, hour: u32) -> Result<GameState, GameError> {
        if hour > 23 {
            return Err(GameError::InvalidRequest(
                "hour must be between 0 and 23".into(),
            ));
        }
        let mut state = self.inner.write().await;
        state.unlock_hour = hour;
        info!(hour, "mission unlock hour set");
        Ok(*state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_unlock_hour_rejects_24() {
        let handle = GameStateHandle::new(&GameSettings::default());

        assert!(matches!(
            handle.set_unlock_hour(24).await,
            Err(GameError::InvalidRequest(_))
        ));
        assert_eq!(handle.get().await.unlock_hour, 9);
    }

    #[tokio::test]
    async fn test_set_day_updates_snapshot() {
        let handle = GameStateHandle::new(&GameSettings::default());

        handle.set_day(3).await.unwrap();

        assert_eq!(handle.get().await.current_day, 3);
    }

    #[tokio::test]
    async fn test_set_day_zero_rejected() {
        let handle = GameStateHandle::new(&GameSettings::default());
        assert!(handle.set_day(0).await.is_err());
    }

    #[test]
    fn test_settings_validated_clamps() {
        let settings = GameSettings {
            start_day: 0,
            unlock_hour: 30,
            news_capacity: 0,
            ..Default::default()
        }
        .validated();
        assert_eq!(settings.start_day, 1);
        assert_eq!(settings.unlock_hour, 23);
        assert_eq!(settings.news_capacity, 1);
    }

    #[test]
    fn test_game_state_serializes_unlock_hour_name() {
        let json = serde_json::to_value(GameState {
            current_day: 2,
            unlock_hour: 9,
        })
        .unwrap();
        assert_eq!(json["mission_unlock_hour"], 9);
    }
}
