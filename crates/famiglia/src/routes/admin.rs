//! `/admin`: direct edits, roster, game control, news and reminders.
//!
//! The game layer refuses every call here from a non-admin caller.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::routing::{delete, get, post};
use famiglia_game::{
    Dashboard, GameState, LifeUpdate, MoneyUpdate, ReminderKind, ReminderReport,
};
use famiglia_protocol::{
    AddPlayerRequest, AssignRoleRequest, CreateMissionRequest, Mission, NewsItem, Player,
    PlayerRefRequest, PublishNewsRequest, ReminderRequest, SetDayQuery, SetHourQuery,
    UpdateItemsRequest, UpdateMoneyRequest, UpdateStatsRequest,
};
use famiglia_store::Storage;
use serde_json::{Value, json};

use super::AppRouter;
use crate::extract::Caller;
use crate::{AppState, FamigliaError};

pub fn router<S: Storage>() -> AppRouter<S> {
    axum::Router::new()
        .route("/admin/update-money", post(update_money::<S>))
        .route("/admin/update-stats", post(update_stats::<S>))
        .route("/admin/update-items", post(update_items::<S>))
        .route("/admin/publish-news", post(publish_news::<S>))
        .route("/admin/news", get(news::<S>))
        .route("/admin/dashboard", get(dashboard::<S>))
        .route("/admin/eliminate-player", post(eliminate::<S>))
        .route("/admin/revive-player", post(revive::<S>))
        .route("/admin/add-player", post(add_player::<S>))
        .route("/admin/assign-role", post(assign_role::<S>))
        .route("/admin/add-mission", post(add_mission::<S>))
        .route("/admin/clear-missions", delete(clear_missions::<S>))
        .route("/admin/game-state", get(game_state::<S>))
        .route("/admin/set-game-day", post(set_game_day::<S>))
        .route("/admin/set-unlock-hour", post(set_unlock_hour::<S>))
        .route("/admin/send-day-start-email", post(send_day_start::<S>))
        .route("/admin/send-mission-unlock-email", post(send_mission_unlock::<S>))
        .route("/admin/send-blackmarket-email", post(send_blackmarket::<S>))
}

// ---------------------------------------------------------------------------
// Direct edits
// ---------------------------------------------------------------------------

async fn update_money<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
    Json(req): Json<UpdateMoneyRequest>,
) -> Result<Json<MoneyUpdate>, FamigliaError> {
    Ok(Json(state.game.update_money(&caller, req).await?))
}

async fn update_stats<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
    Json(req): Json<UpdateStatsRequest>,
) -> Result<Json<Player>, FamigliaError> {
    Ok(Json(state.game.update_stats(&caller, req).await?))
}

async fn update_items<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
    Json(req): Json<UpdateItemsRequest>,
) -> Result<Json<Player>, FamigliaError> {
    Ok(Json(state.game.update_items(&caller, req).await?))
}

// ---------------------------------------------------------------------------
// News and overview
// ---------------------------------------------------------------------------

async fn publish_news<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
    Json(req): Json<PublishNewsRequest>,
) -> Result<Json<NewsItem>, FamigliaError> {
    Ok(Json(state.game.publish_news(&caller, req).await?))
}

async fn news<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(_): Caller,
) -> Json<Vec<NewsItem>> {
    Json(state.game.news_feed().await)
}

async fn dashboard<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
) -> Result<Json<Dashboard>, FamigliaError> {
    Ok(Json(state.game.dashboard(&caller).await?))
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

async fn eliminate<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
    Json(req): Json<PlayerRefRequest>,
) -> Result<Json<LifeUpdate>, FamigliaError> {
    Ok(Json(state.game.eliminate_player(&caller, req).await?))
}

async fn revive<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
    Json(req): Json<PlayerRefRequest>,
) -> Result<Json<LifeUpdate>, FamigliaError> {
    Ok(Json(state.game.revive_player(&caller, req).await?))
}

async fn add_player<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
    Json(req): Json<AddPlayerRequest>,
) -> Result<Json<Player>, FamigliaError> {
    Ok(Json(state.game.add_player(&caller, req).await?))
}

async fn assign_role<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
    Json(req): Json<AssignRoleRequest>,
) -> Result<Json<Player>, FamigliaError> {
    Ok(Json(state.game.assign_role(&caller, req).await?))
}

// ---------------------------------------------------------------------------
// Missions and game state
// ---------------------------------------------------------------------------

async fn add_mission<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
    Json(req): Json<CreateMissionRequest>,
) -> Result<Json<Mission>, FamigliaError> {
    if !caller.is_admin() {
        return Err(famiglia_game::GameError::forbidden("admin access required").into());
    }
    Ok(Json(state.game.create_mission(&caller, req).await?))
}

async fn clear_missions<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
) -> Result<Json<Value>, FamigliaError> {
    state.game.clear_missions(&caller).await?;
    Ok(Json(json!({ "success": true, "message": "all missions cleared" })))
}

async fn game_state<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
) -> Result<Json<GameState>, FamigliaError> {
    Ok(Json(state.game.game_state(&caller).await?))
}

async fn set_game_day<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
    Query(query): Query<SetDayQuery>,
) -> Result<Json<GameState>, FamigliaError> {
    Ok(Json(state.game.set_game_day(&caller, query.day).await?))
}

async fn set_unlock_hour<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
    Query(query): Query<SetHourQuery>,
) -> Result<Json<GameState>, FamigliaError> {
    Ok(Json(state.game.set_unlock_hour(&caller, query.hour).await?))
}

// ---------------------------------------------------------------------------
// Reminders
// ---------------------------------------------------------------------------

/// Reminder bodies are optional; an empty body means "test recipient".
async fn send<S: Storage>(
    state: &AppState<S>,
    caller: &famiglia_session::Identity,
    kind: ReminderKind,
    req: Option<Json<ReminderRequest>>,
) -> Result<Json<ReminderReport>, FamigliaError> {
    let req = req.map(|Json(r)| r).unwrap_or_default();
    Ok(Json(state.game.send_reminder(caller, kind, req).await?))
}

async fn send_day_start<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
    req: Option<Json<ReminderRequest>>,
) -> Result<Json<ReminderReport>, FamigliaError> {
    send(&state, &caller, ReminderKind::DayStart, req).await
}

async fn send_mission_unlock<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
    req: Option<Json<ReminderRequest>>,
) -> Result<Json<ReminderReport>, FamigliaError> {
    send(&state, &caller, ReminderKind::MissionUnlock, req).await
}

async fn send_blackmarket<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
    req: Option<Json<ReminderRequest>>,
) -> Result<Json<ReminderReport>, FamigliaError> {
    send(&state, &caller, ReminderKind::Blackmarket, req).await
}
