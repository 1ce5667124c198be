//! API route definitions.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, middleware};
use serde_json::json;

use recess_db::repositories::LedgerError;

use crate::{AppState, middleware::scheduler::scheduler_auth_middleware};

pub mod accrual;
pub mod allocations;
pub mod balances;
pub mod grants;
pub mod health;
pub mod requests;

/// Creates the API router with all routes, wiring the scheduler secret
/// middleware around the accrual endpoint.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let scheduler_routes = accrual::routes().layer(middleware::from_fn_with_state(
        state,
        scheduler_auth_middleware,
    ));

    Router::new()
        .merge(health::routes())
        .merge(balances::routes())
        .merge(grants::routes())
        .merge(allocations::routes())
        .merge(requests::routes())
        .merge(scheduler_routes)
}

/// Maps a ledger error onto the JSON error envelope.
pub(crate) fn ledger_error_response(err: &LedgerError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "error": err.error_code(),
            "message": err.to_string(),
            "retryable": err.is_retryable(),
        })),
    )
        .into_response()
}

/// Builds a plain JSON error response.
pub(crate) fn error_response(status: StatusCode, error: &str, message: &str) -> Response {
    (
        status,
        Json(json!({ "error": error, "message": message })),
    )
        .into_response()
}
