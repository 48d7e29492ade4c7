//! `/auth`: login, token refresh, token verification.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::routing::{get, post};
use famiglia_protocol::{
    LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, VerifyQuery, VerifyResponse,
};
use famiglia_session::BEARER;
use famiglia_store::Storage;

use super::AppRouter;
use crate::{AppState, FamigliaError};

pub fn router<S: Storage>() -> AppRouter<S> {
    axum::Router::new()
        .route("/auth/login", post(login::<S>))
        .route("/auth/refresh", post(refresh::<S>))
        .route("/auth/verify", get(verify::<S>))
}

async fn login<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, FamigliaError> {
    let outcome = state.login.login(&req).await.inspect_err(|e| {
        tracing::info!(login = req.login().unwrap_or(""), error = %e, "login refused");
    })?;
    Ok(Json(outcome.into_response()))
}

async fn refresh<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, FamigliaError> {
    let access_token = state.tokens.refresh(&req.refresh_token)?;
    Ok(Json(RefreshResponse {
        access_token,
        token_type: BEARER.to_string(),
    }))
}

/// Accepts either token kind. A token for a player that no longer exists
/// is still reported valid, with only its `player_id`.
async fn verify<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<VerifyResponse>, FamigliaError> {
    let (claims, identity) = state.auth.verify(&query.token).await?;
    Ok(Json(VerifyResponse {
        valid: true,
        player_id: Some(claims.subject.player_id),
        player: identity.map(|i| i.into_profile()),
    }))
}
