//! Request lifecycle endpoints: confirm, release, reverse.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::post};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use recess_db::repositories::LeaveLedgerRepository;

use super::ledger_error_response;
use crate::AppState;

/// Request body for a reversal.
#[derive(Debug, Deserialize)]
pub struct ReverseRequest {
    /// Why the approved leave is being cancelled.
    pub reason: String,
}

/// Flips a request's hold rows to confirmed (approval).
async fn confirm(State(state): State<AppState>, Path(request_id): Path<Uuid>) -> Response {
    match LeaveLedgerRepository::new(state.db.clone())
        .confirm(request_id)
        .await
    {
        Ok(()) => (StatusCode::OK, Json(json!({ "confirmed": true }))).into_response(),
        Err(e) => ledger_error_response(&e),
    }
}

/// Deletes a request's hold rows (rejection/withdrawal).
async fn release(State(state): State<AppState>, Path(request_id): Path<Uuid>) -> Response {
    match LeaveLedgerRepository::new(state.db.clone())
        .release(request_id)
        .await
    {
        Ok(()) => (StatusCode::OK, Json(json!({ "released": true }))).into_response(),
        Err(e) => ledger_error_response(&e),
    }
}

/// Reverses a request's confirmed rows (cancellation after approval).
async fn reverse(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
    Json(body): Json<ReverseRequest>,
) -> Response {
    match LeaveLedgerRepository::new(state.db.clone())
        .reverse(request_id, &body.reason)
        .await
    {
        Ok(()) => (StatusCode::OK, Json(json!({ "reversed": true }))).into_response(),
        Err(e) => ledger_error_response(&e),
    }
}

/// Creates request lifecycle routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/requests/{request_id}/confirm", post(confirm))
        .route("/requests/{request_id}/release", post(release))
        .route("/requests/{request_id}/reverse", post(reverse))
}
