//! `/blackmarket`: listings, purchases and offer admin.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use famiglia_game::{OfferBoard, PurchaseReceipt};
use famiglia_protocol::{CreateOfferRequest, Offer, OfferId};
use famiglia_store::Storage;
use serde_json::{Value, json};

use super::AppRouter;
use crate::extract::Caller;
use crate::{AppState, FamigliaError};

pub fn router<S: Storage>() -> AppRouter<S> {
    axum::Router::new()
        .route("/blackmarket/offers", get(offers::<S>))
        .route("/blackmarket/purchase/{offer_id}", post(purchase::<S>))
        .route("/blackmarket/admin/create-offer", post(create_offer::<S>))
        .route(
            "/blackmarket/admin/delete-offer/{offer_id}",
            delete(delete_offer::<S>),
        )
        .route("/blackmarket/admin/all-offers", get(all_offers::<S>))
}

async fn offers<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(_): Caller,
) -> Result<Json<OfferBoard>, FamigliaError> {
    Ok(Json(state.game.offers().await?))
}

async fn purchase<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
    Path(offer_id): Path<u64>,
) -> Result<Json<PurchaseReceipt>, FamigliaError> {
    Ok(Json(state.game.purchase(&caller, OfferId(offer_id)).await?))
}

async fn create_offer<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
    Json(req): Json<CreateOfferRequest>,
) -> Result<Json<Offer>, FamigliaError> {
    Ok(Json(state.game.create_offer(&caller, req).await?))
}

async fn delete_offer<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
    Path(offer_id): Path<u64>,
) -> Result<Json<Value>, FamigliaError> {
    let offer_id = OfferId(offer_id);
    state.game.delete_offer(&caller, offer_id).await?;
    Ok(Json(json!({ "success": true, "offer_id": offer_id })))
}

async fn all_offers<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Caller(caller): Caller,
) -> Result<Json<Vec<Offer>>, FamigliaError> {
    Ok(Json(state.game.all_offers(&caller).await?))
}
