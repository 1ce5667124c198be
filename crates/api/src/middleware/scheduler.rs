//! Shared-secret middleware for the scheduler-invoked accrual endpoint.
//!
//! The external scheduler authenticates with a pre-shared secret in the
//! `X-Scheduler-Secret` header. Human-user authentication is handled by the
//! surrounding application and is out of scope here.

use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::AppState;

/// Header carrying the scheduler's shared secret.
pub const SCHEDULER_SECRET_HEADER: &str = "x-scheduler-secret";

/// Rejects requests whose shared secret does not match the configured one.
pub async fn scheduler_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(SCHEDULER_SECRET_HEADER)
        .and_then(|h| h.to_str().ok());

    match presented {
        Some(secret) if secret == state.scheduler_secret.as_ref() => next.run(request).await,
        Some(_) => unauthorized("invalid_scheduler_secret", "Scheduler secret does not match"),
        None => unauthorized(
            "missing_scheduler_secret",
            "X-Scheduler-Secret header is required",
        ),
    }
}

fn unauthorized(error: &str, message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": error, "message": message })),
    )
        .into_response()
}
