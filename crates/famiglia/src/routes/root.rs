use axum::Json;
use axum::routing::get;
use famiglia_store::Storage;
use serde_json::{Value, json};

use super::AppRouter;

pub fn router<S: Storage>() -> AppRouter<S> {
    axum::Router::new().route("/", get(welcome))
}

async fn welcome() -> Json<Value> {
    Json(json!({
        "message": "Welcome to The Godfather: Office Mafia API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "operational",
    }))
}
