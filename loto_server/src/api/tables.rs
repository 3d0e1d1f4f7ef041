//! Table and sheet API handlers.
//!
//! Read-only HTTP endpoints:
//! - The current table snapshot
//! - Fresh sheets and tickets for players to play with
//!
//! # Examples
//!
//! ```bash
//! curl http://localhost:3000/api/v1/state
//! curl "http://localhost:3000/api/v1/sheet?seed=7"
//! ```

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use loto::{Sheet, Ticket, generate_sheet, generate_ticket, table::TableStateResponse};
use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use super::{AppState, request_id::RequestId};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Optional seed for reproducible sheets
#[derive(Debug, Default, Deserialize)]
pub struct SheetQuery {
    pub seed: Option<u64>,
}

impl SheetQuery {
    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        }
    }
}

/// Get the current table state.
///
/// # Response
///
/// Returns `200 OK` with the snapshot clients receive over the socket, plus
/// the called-number history:
/// ```json
/// {
///   "tableName": "Loto Table",
///   "view": {"players": [], "pot": 0, "ticketPrice": 0, "gameState": "IDLE"},
///   "calledNumbers": [],
///   "lastCalled": null,
///   "connectionCount": 0,
///   "hasHost": false
/// }
/// ```
///
/// # Errors
///
/// - `503 Service Unavailable`: Table actor has stopped
pub async fn get_state(
    State(state): State<AppState>,
) -> Result<Json<TableStateResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.table.state().await {
        Ok(table_state) => Ok(Json(table_state)),
        Err(e) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

/// Generate a full sheet of three tickets.
///
/// The body is the nine rows of the sheet, top to bottom, each nine cells
/// wide with `null` for blanks. This is the shape a win claim submits.
pub async fn get_sheet(request_id: RequestId, Query(query): Query<SheetQuery>) -> Json<Sheet> {
    let sheet = generate_sheet(&mut query.rng());
    tracing::debug!(request_id = %request_id.as_str(), seed = ?query.seed, "Generated sheet");
    Json(sheet)
}

/// Generate a single ticket (three rows).
pub async fn get_ticket(Query(query): Query<SheetQuery>) -> Json<Ticket> {
    Json(generate_ticket(&mut query.rng()))
}
