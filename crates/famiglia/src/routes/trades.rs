//! `/trades`: money transfers and the ledger.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::routing::{get, post};
use famiglia_game::TransferReceipt;
use famiglia_protocol::{TradeRecord, TransferMoneyRequest};
use famiglia_store::Storage;

use super::AppRouter;
use crate::extract::Caller;
use crate::{AppState, FamigliaError};

pub fn router<S: Storage>() -> AppRouter<S> {
    axum::Router::new()
        .route("/trades/transfer-money", post(transfer::<S>))
        .route("/trades/history", get(history::<S>))
        .route("/trades/all", get(all::<S>))
}

async fn transfer<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
    Json(req): Json<TransferMoneyRequest>,
) -> Result<Json<TransferReceipt>, FamigliaError> {
    Ok(Json(state.game.transfer(&caller, req).await?))
}

async fn history<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
) -> Result<Json<Vec<TradeRecord>>, FamigliaError> {
    Ok(Json(state.game.trade_history(&caller).await?))
}

async fn all<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
) -> Result<Json<Vec<TradeRecord>>, FamigliaError> {
    Ok(Json(state.game.all_trades(&caller).await?))
}
