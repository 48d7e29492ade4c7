//! End-to-end tests driving the router with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use chrono::{DateTime, TimeZone, Utc};
use famiglia::prelude::*;
use famiglia_game::game_offset;
use famiglia_protocol::{Offer, OfferId, Player, PlayerId};
use famiglia_store::{OfferStore, PlayerStore, Storage};
use serde_json::{Value, json};
use tower::ServiceExt;

// =========================================================================
// Helpers
// =========================================================================

struct TestApp {
    app: Router,
    clock: Arc<FixedClock>,
    config: ServerConfig,
}

fn local(h: u32, m: u32) -> DateTime<Utc> {
    game_offset()
        .with_ymd_and_hms(2025, 3, 14, h, m, 0)
        .single()
        .unwrap()
        .with_timezone(&Utc)
}

async fn test_app() -> TestApp {
    let storage = Arc::new(MemoryStorage::new());

    let mut michael = Player::new("Michael", "michael@example.com", "pw");
    michael.assigned_role = "Consigliere".into();
    michael.family = "Corleone".into();
    storage.players().append(michael).await.unwrap();

    let mut fredo = Player::new("Fredo", "fredo@example.com", "pw");
    fredo.player_id = Some(PlayerId::from("p-fredo"));
    fredo.assigned_role = "Soldier".into();
    fredo.role = "Soldier".into();
    fredo.family = "Corleone".into();
    fredo.balance = 1000.0;
    fredo.registered = true;
    storage.players().append(fredo).await.unwrap();

    storage
        .offers()
        .append(Offer {
            offer_id: OfferId(0),
            item_name: "Vest".into(),
            description: String::new(),
            price: 100.0,
            quantity_available: 1,
        })
        .await
        .unwrap();

    let config = ServerConfig {
        tokens: TokenConfig {
            secret: "test-secret".into(),
            ..Default::default()
        },
        ..Default::default()
    };
    let clock = Arc::new(FixedClock::new(local(12, 0)));
    let state = Arc::new(AppState::new(storage, &config, clock.clone()));
    TestApp {
        app: router(state),
        clock,
        config,
    }
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header("authorization", format!("Bearer {token}"));
    }
    let req = match body {
        Some(body) => req
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn login(app: &Router, email: &str, password: &str, role: Option<&str>) -> (StatusCode, Value) {
    let mut body = json!({ "email": email, "password": password });
    if let Some(role) = role {
        body["role"] = json!(role);
    }
    call(app, Method::POST, "/auth/login", None, Some(body)).await
}

async fn admin_token(t: &TestApp) -> String {
    let (status, body) = login(&t.app, &t.config.admin.email, &t.config.admin.password, None).await;
    assert_eq!(status, StatusCode::OK);
    body["access_token"].as_str().unwrap().to_string()
}

async fn fredo_token(t: &TestApp) -> String {
    let (status, body) = login(&t.app, "fredo@example.com", "pw", Some("Soldier")).await;
    assert_eq!(status, StatusCode::OK);
    body["access_token"].as_str().unwrap().to_string()
}

// =========================================================================
// Public routes
// =========================================================================

#[tokio::test]
async fn test_root_returns_banner() {
    let t = test_app().await;
    let (status, body) = call(&t.app, Method::GET, "/", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "operational");
}

#[tokio::test]
async fn test_protected_route_without_token_is_401() {
    let t = test_app().await;
    let (status, body) = call(&t.app, Method::GET, "/player/me/profile", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert!(body["detail"].as_str().is_some());
}

#[tokio::test]
async fn test_garbage_token_is_401() {
    let t = test_app().await;
    let (status, _) = call(&t.app, Method::GET, "/player/me/profile", Some("nope"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =========================================================================
// Auth
// =========================================================================

#[tokio::test]
async fn test_first_login_probe_then_claim() {
    let t = test_app().await;

    let (status, probe) = login(&t.app, "michael@example.com", "pw", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(probe["is_first_login"], true);
    assert_eq!(probe["assigned_role"], "Consigliere");
    assert_eq!(probe["access_token"], "");

    let (status, claimed) = login(&t.app, "michael@example.com", "pw", Some("Consigliere")).await;
    assert_eq!(status, StatusCode::OK);
    let token = claimed["access_token"].as_str().unwrap();

    let (status, profile) = call(&t.app, Method::GET, "/player/me/profile", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["role"], "Consigliere");
    assert_eq!(profile["is_admin"], false);
    assert!(profile.get("password").is_none());
}

#[tokio::test]
async fn test_login_wrong_role_is_403_missing_role_is_400() {
    let t = test_app().await;

    let (status, _) = login(&t.app, "fredo@example.com", "pw", Some("Don")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = login(&t.app, "fredo@example.com", "pw", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_wrong_password_is_401() {
    let t = test_app().await;
    let (status, body) = login(&t.app, "fredo@example.com", "wrong", Some("Soldier")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_refresh_token_rejected_as_access_token() {
    let t = test_app().await;
    let (_, body) = login(&t.app, "fredo@example.com", "pw", Some("Soldier")).await;
    let refresh = body["refresh_token"].as_str().unwrap();

    let (status, _) = call(&t.app, Method::GET, "/player/me/profile", Some(refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, renewed) = call(
        &t.app,
        Method::POST,
        "/auth/refresh",
        None,
        Some(json!({ "refresh_token": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let access = renewed["access_token"].as_str().unwrap();
    let (status, _) = call(&t.app, Method::GET, "/player/me/profile", Some(access), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_verify_reports_player() {
    let t = test_app().await;
    let token = fredo_token(&t).await;

    let (status, body) = call(
        &t.app,
        Method::GET,
        &format!("/auth/verify?token={token}"),
        None,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["player_id"], "p-fredo");
    assert_eq!(body["player"]["name"], "Fredo");
}

// =========================================================================
// Game routes
// =========================================================================

#[tokio::test]
async fn test_purchase_market_closed_is_403_then_open_succeeds() {
    let t = test_app().await;
    let token = fredo_token(&t).await;

    let (status, body) = call(&t.app, Method::POST, "/blackmarket/purchase/1", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    t.clock.set(local(23, 20));
    let (status, body) = call(&t.app, Method::POST, "/blackmarket/purchase/1", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["new_balance"], 900.0);

    let (status, _) = call(&t.app, Method::POST, "/blackmarket/purchase/1", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_player_calling_admin_route_is_403() {
    let t = test_app().await;
    let token = fredo_token(&t).await;

    let (status, _) = call(&t.app, Method::GET, "/admin/dashboard", Some(&token), None).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_dashboard_and_game_day() {
    let t = test_app().await;
    let token = admin_token(&t).await;

    let (status, body) = call(&t.app, Method::GET, "/admin/dashboard", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_players"], 2);
    assert_eq!(body["unclaimed_players"], 1);

    let (status, body) = call(
        &t.app,
        Method::POST,
        "/admin/set-game-day?day=3",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_day"], 3);

    let (status, _) = call(
        &t.app,
        Method::POST,
        "/admin/set-unlock-hour?hour=24",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_assign_role_then_player_can_claim() {
    let t = test_app().await;
    let token = admin_token(&t).await;

    let (status, _) = call(
        &t.app,
        Method::POST,
        "/admin/add-player",
        Some(&token),
        Some(json!({ "name": "Kay", "email": "kay@example.com", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = login(&t.app, "kay@example.com", "pw", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "pending approval");

    let (status, _) = call(
        &t.app,
        Method::POST,
        "/admin/assign-role",
        Some(&token),
        Some(json!({ "email": "kay@example.com", "role": "Merchant", "family": "Corleone" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = login(&t.app, "kay@example.com", "pw", Some("Merchant")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["player"]["family"], "Corleone");
}

#[tokio::test]
async fn test_transfer_and_history() {
    let t = test_app().await;
    let admin = admin_token(&t).await;
    let (_, _) = login(&t.app, "michael@example.com", "pw", Some("Consigliere")).await;
    let (_, players) = call(&t.app, Method::GET, "/player/", Some(&admin), None).await;
    let michael_id = players["players"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["name"] == "Michael")
        .and_then(|p| p["player_id"].as_str())
        .unwrap()
        .to_string();

    let fredo = fredo_token(&t).await;
    let (status, body) = call(
        &t.app,
        Method::POST,
        "/trades/transfer-money",
        Some(&fredo),
        Some(json!({ "to_player_id": michael_id, "amount": 400.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["new_balance"], 600.0);

    let (status, history) = call(&t.app, Method::GET, "/trades/history", Some(&fredo), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);

    let (status, _) = call(
        &t.app,
        Method::POST,
        "/trades/transfer-money",
        Some(&fredo),
        Some(json!({ "to_player_id": michael_id, "amount": 10_000.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_family_routes() {
    let t = test_app().await;
    let token = fredo_token(&t).await;

    let (status, families) = call(&t.app, Method::GET, "/families/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(families[0]["family_name"], "Corleone");

    let (status, mine) = call(&t.app, Method::GET, "/families/my/family", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["members"].as_array().unwrap().len(), 2);

    let (status, _) = call(&t.app, Method::GET, "/families/Barzini", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
