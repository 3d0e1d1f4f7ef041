//! Integration tests for the HTTP endpoints.
//!
//! Each test builds the router around a freshly spawned table actor and
//! drives it with `tower::ServiceExt::oneshot`, no sockets involved.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use loto::{
    entities::{ConnectionId, Phase},
    table::{PlayerAction, TableActor, TableConfig, TableHandle, TableStateResponse},
};
use serde_json::Value;
use std::collections::HashSet;
use tower::ServiceExt; // For `oneshot` method

const SECRET: &str = "http-test-secret";

fn create_test_server() -> (axum::Router, TableHandle) {
    let config = TableConfig {
        host_secret: Some(SECRET.to_string()),
        rng_seed: Some(1),
        ..Default::default()
    };
    let (actor, table) = TableActor::new(config);
    tokio::spawn(actor.run());

    let state = loto_server::api::AppState {
        table: table.clone(),
    };
    (loto_server::api::create_router(state), table)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn numbers_in(rows: &Value) -> Vec<u64> {
    rows.as_array()
        .unwrap()
        .iter()
        .flat_map(|row| row.as_array().unwrap().iter().filter_map(Value::as_u64))
        .collect()
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check_endpoint() {
    let (app, _) = create_test_server();

    let (status, body) = get(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["table"]["healthy"], true);
    assert_eq!(body["table"]["phase"], "IDLE");
    assert_eq!(body["table"]["hasHost"], false);
}

#[tokio::test]
async fn test_health_check_after_table_closed() {
    let (app, table) = create_test_server();
    table.close().await.unwrap();
    while !table.is_closed() {
        tokio::task::yield_now().await;
    }

    let (status, body) = get(app, "/health").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
}

// ============================================================================
// State Tests
// ============================================================================

#[tokio::test]
async fn test_state_reflects_actions() {
    let (app, table) = create_test_server();

    let host = ConnectionId::new();
    let _events = table.connect(host).await.unwrap();
    table
        .act(
            host,
            PlayerAction::Join {
                name: "Host".to_string(),
                secret: Some(SECRET.to_string()),
            },
        )
        .await
        .unwrap();
    table
        .act(host, PlayerAction::OpenBetting { price: 10 })
        .await
        .unwrap();
    table.act(host, PlayerAction::BuyTicket).await.unwrap();

    let (status, body) = get(app, "/api/v1/state").await;
    assert_eq!(status, StatusCode::OK);

    let state: TableStateResponse = serde_json::from_value(body).unwrap();
    assert_eq!(state.view.game_state, Phase::Betting);
    assert_eq!(state.view.pot, 10);
    assert_eq!(state.view.ticket_price, 10);
    assert!(state.has_host);
    assert_eq!(state.connection_count, 1);

    let player = state.view.player(&host).unwrap();
    assert_eq!(player.balance, 490);
    assert!(player.has_ticket);
    assert!(!player.is_approved);
    assert!(player.is_host);
}

#[tokio::test]
async fn test_state_uses_camel_case() {
    let (app, _) = create_test_server();

    let (_, body) = get(app, "/api/v1/state").await;

    assert!(body.get("tableName").is_some());
    assert!(body.get("calledNumbers").is_some());
    assert!(body["lastCalled"].is_null());
    assert!(body["view"].get("ticketPrice").is_some());
    assert!(body["view"].get("gameState").is_some());
}

// ============================================================================
// Sheet Tests
// ============================================================================

#[tokio::test]
async fn test_sheet_endpoint_shape() {
    let (app, _) = create_test_server();

    let (status, body) = get(app, "/api/v1/sheet").await;
    assert_eq!(status, StatusCode::OK);

    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 9);
    for row in rows {
        let cells = row.as_array().unwrap();
        assert_eq!(cells.len(), 9);
        assert_eq!(cells.iter().filter(|c| !c.is_null()).count(), 5);
    }

    let numbers = numbers_in(&body);
    assert_eq!(numbers.len(), 45);
    assert_eq!(numbers.iter().collect::<HashSet<_>>().len(), 45);
    assert!(numbers.iter().all(|n| (1..=90).contains(n)));
}

#[tokio::test]
async fn test_seeded_sheet_is_reproducible() {
    let (app, _) = create_test_server();

    let (_, first) = get(app.clone(), "/api/v1/sheet?seed=12").await;
    let (_, second) = get(app.clone(), "/api/v1/sheet?seed=12").await;
    let (_, other) = get(app, "/api/v1/sheet?seed=13").await;

    assert_eq!(first, second);
    assert_ne!(first, other);
}

#[tokio::test]
async fn test_ticket_endpoint_shape() {
    let (app, _) = create_test_server();

    let (status, body) = get(app, "/api/v1/ticket?seed=3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);
    assert_eq!(numbers_in(&body).len(), 15);
}

#[tokio::test]
async fn test_bad_seed_is_rejected() {
    let (app, _) = create_test_server();

    let (status, _) = get(app, "/api/v1/sheet?seed=banana").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Middleware Tests
// ============================================================================

#[tokio::test]
async fn test_404_for_invalid_endpoint() {
    let (app, _) = create_test_server();

    let (status, _) = get(app, "/api/v1/nonexistent").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_headers_present() {
    let (app, _) = create_test_server();

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://example.com")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS headers should be present"
    );
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let (app, _) = create_test_server();

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "trace-me-42")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "trace-me-42");
}

#[tokio::test]
async fn test_request_id_is_generated() {
    let (app, _) = create_test_server();

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let id = response.headers()["x-request-id"].to_str().unwrap();
    assert!(uuid_like(id), "expected a uuid, got {id}");
}

fn uuid_like(s: &str) -> bool {
    s.len() == 36 && s.chars().filter(|&c| c == '-').count() == 4
}

#[tokio::test]
async fn test_websocket_route_requires_upgrade() {
    let (app, _) = create_test_server();

    let (status, _) = get(app, "/ws").await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_concurrent_health_checks() {
    let (app, _) = create_test_server();

    let mut handles = vec![];
    for _ in 0..10 {
        let app_clone = app.clone();
        handles.push(tokio::spawn(async move { get(app_clone, "/health").await }));
    }

    for handle in handles {
        let (status, _) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }
}
