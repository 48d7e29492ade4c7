//! `/families`: aggregates derived from player records.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use famiglia_game::FamilyMembers;
use famiglia_protocol::{FamilySummary, LimitQuery};
use famiglia_store::Storage;

use super::AppRouter;
use crate::extract::Caller;
use crate::{AppState, FamigliaError};

pub fn router<S: Storage>() -> AppRouter<S> {
    axum::Router::new()
        .route("/families/", get(list::<S>))
        .route("/families/leaderboard/top", get(leaderboard::<S>))
        .route("/families/my/family", get(mine::<S>))
        .route("/families/{family_name}", get(one::<S>))
        .route("/families/{family_name}/members", get(members::<S>))
}

async fn list<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(_): Caller,
) -> Result<Json<Vec<FamilySummary>>, FamigliaError> {
    Ok(Json(state.game.families().await?))
}

async fn leaderboard<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(_): Caller,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<FamilySummary>>, FamigliaError> {
    Ok(Json(state.game.family_leaderboard(query.limit).await?))
}

async fn one<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(_): Caller,
    Path(family_name): Path<String>,
) -> Result<Json<FamilySummary>, FamigliaError> {
    Ok(Json(state.game.family(&family_name).await?))
}

async fn members<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(_): Caller,
    Path(family_name): Path<String>,
) -> Result<Json<FamilyMembers>, FamigliaError> {
    Ok(Json(state.game.family_members(&family_name).await?))
}

async fn mine<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
) -> Result<Json<FamilyMembers>, FamigliaError> {
    Ok(Json(state.game.my_family(&caller).await?))
}
