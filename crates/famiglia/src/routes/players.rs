//! `/player`: rosters, profiles, the leaderboard and the news feed.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use famiglia_game::ScoreUpdate;
use famiglia_protocol::{LeaderboardEntry, LimitQuery, NewsItem, Player, PlayerId, ProfileView};
use famiglia_store::Storage;
use serde::Serialize;

use super::AppRouter;
use crate::extract::Caller;
use crate::{AppState, FamigliaError};

pub fn router<S: Storage>() -> AppRouter<S> {
    axum::Router::new()
        .route("/player/", get(list::<S>))
        .route("/player/me/profile", get(profile::<S>))
        .route("/player/me/mark-dead", post(mark_dead::<S>))
        .route("/player/leaderboard/top", get(leaderboard::<S>))
        .route("/player/news/all", get(news::<S>))
        .route("/player/{player_id}", get(one::<S>))
        .route("/player/{player_id}/update-score", post(update_score::<S>))
}

#[derive(Serialize)]
struct PlayerList {
    players: Vec<Player>,
    total: usize,
}

async fn list<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(_): Caller,
) -> Result<Json<PlayerList>, FamigliaError> {
    let players = state.game.players().await?;
    Ok(Json(PlayerList {
        total: players.len(),
        players,
    }))
}

async fn one<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
    Path(player_id): Path<String>,
) -> Result<Json<Player>, FamigliaError> {
    Ok(Json(state.game.player(&caller, &PlayerId(player_id)).await?))
}

async fn profile<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
) -> Json<ProfileView> {
    Json(state.game.profile(&caller))
}

async fn leaderboard<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(_): Caller,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<LeaderboardEntry>>, FamigliaError> {
    Ok(Json(state.game.leaderboard(query.limit).await?))
}

async fn update_score<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
    Path(player_id): Path<String>,
) -> Result<Json<ScoreUpdate>, FamigliaError> {
    Ok(Json(
        state
            .game
            .update_score(&caller, &PlayerId(player_id))
            .await?,
    ))
}

async fn news<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(_): Caller,
) -> Json<Vec<NewsItem>> {
    Json(state.game.news_feed().await)
}

async fn mark_dead<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
) -> Result<Json<Player>, FamigliaError> {
    Ok(Json(state.game.mark_dead(&caller).await?))
}
