//! HTTP/WebSocket API for the loto server.
//!
//! # Architecture
//!
//! The API is built with:
//! - **Axum**: Async web framework for HTTP/WebSocket
//! - **Tower**: Middleware for CORS and request ids
//! - **Actor Model**: The table state is owned by one actor task; handlers
//!   only hold a [`TableHandle`]
//!
//! # Modules
//!
//! - [`tables`]: Table snapshot and sheet generation
//! - [`websocket`]: Real-time play
//! - [`rate_limiter`]: Per-connection frame limits
//! - [`request_id`]: Request id propagation
//!
//! # Endpoints Overview
//!
//! ```text
//! GET /health            - Server health status
//! GET /api/v1/state      - Table snapshot
//! GET /api/v1/sheet      - Fresh 3-ticket sheet (?seed=N)
//! GET /api/v1/ticket     - Fresh single ticket (?seed=N)
//! GET /ws                - WebSocket for play
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use loto::table::{TableActor, TableConfig};
//! use loto_server::api::{create_router, AppState};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (actor, table) = TableActor::new(TableConfig::default());
//! tokio::spawn(actor.run());
//!
//! let app = create_router(AppState { table });
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod rate_limiter;
pub mod request_id;
pub mod tables;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use loto::table::TableHandle;
use serde_json::json;
use std::time::Duration;
use tower_http::cors::CorsLayer;

/// How long the health check waits for the table actor
const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

/// Application state shared across all HTTP handlers and WebSocket connections.
///
/// Cloned for each request; the handle is just a channel sender.
#[derive(Clone)]
pub struct AppState {
    pub table: TableHandle,
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/state", get(tables::get_state))
        .route("/sheet", get(tables::get_sheet))
        .route("/ticket", get(tables::get_ticket));

    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket::websocket_handler))
        .nest("/api/v1", v1_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the table actor answers a state query in time, or
/// `503 Service Unavailable` otherwise.
///
/// ```bash
/// curl http://localhost:3000/health
/// # {"status":"healthy","table":{"healthy":true,"players":2,"connections":2,"hasHost":true},...}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let table_state = tokio::time::timeout(HEALTH_TIMEOUT, state.table.state())
        .await
        .ok()
        .and_then(Result::ok);

    let healthy = table_state.is_some();
    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let table = match &table_state {
        Some(s) => json!({
            "healthy": true,
            "phase": s.view.game_state,
            "players": s.view.players.len(),
            "connections": s.connection_count,
            "hasHost": s.has_host,
        }),
        None => json!({ "healthy": false }),
    };

    let response = json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "table": table,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
