//! `/missions`: gated listings, completion and creation.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use famiglia_game::{CompletionReceipt, MissionList, TodayMissions};
use famiglia_protocol::{CompleteMissionRequest, CreateMissionRequest, DayQuery, Mission, MissionId};
use famiglia_store::Storage;

use super::AppRouter;
use crate::extract::Caller;
use crate::{AppState, FamigliaError};

pub fn router<S: Storage>() -> AppRouter<S> {
    axum::Router::new()
        .route("/missions/today", get(today::<S>))
        .route("/missions/all", get(all::<S>))
        .route("/missions/complete", post(complete::<S>))
        .route("/missions/create", post(create::<S>))
        .route("/missions/admin/all-missions", get(admin_all::<S>))
        .route("/missions/{mission_id}", get(one::<S>))
}

async fn today<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
) -> Result<Json<TodayMissions>, FamigliaError> {
    Ok(Json(state.game.today_missions(&caller).await?))
}

async fn all<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
    Query(query): Query<DayQuery>,
) -> Result<Json<MissionList>, FamigliaError> {
    Ok(Json(state.game.missions(&caller, query.day).await?))
}

async fn one<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
    Path(mission_id): Path<u64>,
) -> Result<Json<Mission>, FamigliaError> {
    Ok(Json(state.game.mission(&caller, MissionId(mission_id)).await?))
}

async fn complete<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
    Json(req): Json<CompleteMissionRequest>,
) -> Result<Json<CompletionReceipt>, FamigliaError> {
    Ok(Json(state.game.complete_mission(&caller, req).await?))
}

async fn create<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
    Json(req): Json<CreateMissionRequest>,
) -> Result<Json<Mission>, FamigliaError> {
    Ok(Json(state.game.create_mission(&caller, req).await?))
}

async fn admin_all<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
) -> Result<Json<Vec<Mission>>, FamigliaError> {
    Ok(Json(state.game.all_missions(&caller).await?))
}
