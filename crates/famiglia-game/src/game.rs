//! The [`Game`] service: every rule that touches stored state.
//!
//! `Game` owns the handles the rules need (storage, clock, game state,
//! news board, notifier). The operations themselves live in one
//! `impl Game` block per area (`missions`, `market`, `trades`,
//! `families`, `players`, `admin`).
//!
//! # Balance mutations
//!
//! Every change to a player's balance or stats goes through
//! [`Game::mutate_player`], which re-reads the player, lets the caller
//! compute a patch from the fresh record, recomputes the score, and writes
//! with a compare-and-swap on the record version. A conflicting write is
//! retried on a fresh read, up to [`CAS_RETRIES`] times.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use famiglia_protocol::{Player, PlayerId};
use famiglia_session::Identity;
use famiglia_store::{PlayerPatch, PlayerStore, Storage, StoreError};
use tracing::debug;

use crate::{Clock, GameError, GameSettings, GameStateHandle, NewsBoard, Notifier, score};

/// Retries after a version conflict before giving up.
pub const CAS_RETRIES: u32 = 3;

/// Game rules bound to a storage backend and a notifier.
pub struct Game<S, N> {
    storage: Arc<S>,
    notifier: N,
    clock: Arc<dyn Clock>,
    state: GameStateHandle,
    news: NewsBoard,
    settings: GameSettings,
}

impl<S: Storage, N: Notifier> Game<S, N> {
    pub fn new(storage: Arc<S>, notifier: N, clock: Arc<dyn Clock>, settings: GameSettings) -> Self {
        let settings = settings.validated();
        Self {
            storage,
            notifier,
            clock,
            state: GameStateHandle::new(&settings),
            news: NewsBoard::new(settings.news_capacity),
            settings,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub(crate) fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn state(&self) -> &GameStateHandle {
        &self.state
    }

    pub fn news(&self) -> &NewsBoard {
        &self.news
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// The current instant, from the injected clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // -----------------------------------------------------------------------
    // Shared helpers
    // -----------------------------------------------------------------------

    /// Loads a player by id or fails with `NotFound`.
    pub(crate) async fn require_player(&self, id: &PlayerId) -> Result<Player, GameError> {
        self.storage
            .players()
            .get_by_id(id)
            .await?
            .ok_or_else(|| GameError::NotFound(format!("player {id}")))
    }

    /// Read-modify-write of one player with optimistic concurrency.
    ///
    /// `change` sees the freshest record and returns the patch to apply,
    /// or an error to abort without writing. It may run more than once.
    /// The patch always gets a recomputed `individual_score`.
    pub(crate) async fn mutate_player<F>(
        &self,
        id: &PlayerId,
        mut change: F,
    ) -> Result<Player, GameError>
    where
        F: FnMut(&Player) -> Result<PlayerPatch, GameError> + Send,
    {
        let players = self.storage.players();
        let mut attempt = 0;
        loop {
            let current = self.require_player(id).await?;
            let mut patch = change(&current)?;

            let mut preview = current.clone();
            patch.clone().apply(&mut preview);
            patch.individual_score = Some(score::rescore(&preview));

            match players.update(id, patch, Some(current.version)).await {
                Ok(updated) => return Ok(updated),
                Err(StoreError::Conflict { .. }) if attempt < CAS_RETRIES => {
                    attempt += 1;
                    debug!(player_id = %id, attempt, "version conflict, re-reading player");
                }
                Err(StoreError::Conflict { .. }) => {
                    return Err(GameError::Conflict(format!("player {id}")));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Fails with `Forbidden` unless the caller is the admin.
pub(crate) fn require_admin(identity: &Identity) -> Result<(), GameError> {
    if identity.is_admin() {
        Ok(())
    } else {
        Err(GameError::forbidden("admin access required"))
    }
}

/// Returns the caller's stored record, or `Forbidden` for the admin, who
/// has none.
pub(crate) fn require_stored_player<'a>(
    identity: &'a Identity,
    action: &str,
) -> Result<&'a Player, GameError> {
    match identity {
        Identity::Player(player) => Ok(player),
        Identity::Admin(_) => Err(GameError::Forbidden(format!("the admin cannot {action}"))),
    }
}

impl<S, N> std::fmt::Debug for Game<S, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
