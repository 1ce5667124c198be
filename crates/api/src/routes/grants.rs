//! Grant endpoints: per-grant drill-down and manual/back-fill grants.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::get};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use recess_db::repositories::{GrantRepoError, GrantRepository, ManualGrantInput};

use super::error_response;
use crate::AppState;

/// Query parameters for the grant listing.
#[derive(Debug, Deserialize)]
pub struct GrantListQuery {
    /// The employee whose grants are listed.
    pub user_id: Uuid,
    /// Restrict to one leave type.
    pub leave_type_id: Option<Uuid>,
    /// Expiry cutoff for the `is_expired` flag; defaults to today (UTC).
    pub as_of: Option<NaiveDate>,
}

/// Request body for a manual/back-fill grant.
#[derive(Debug, Deserialize)]
pub struct CreateGrantRequest {
    /// The company the grant belongs to.
    pub company_id: Uuid,
    /// The receiving employee.
    pub user_id: Uuid,
    /// The leave type being granted.
    pub leave_type_id: Uuid,
    /// Granted quantity in hours.
    pub quantity_hours: Decimal,
    /// Explicit grant date.
    pub granted_on: NaiveDate,
    /// Explicit expiry; omitted = never expires.
    pub expires_on: Option<NaiveDate>,
    /// Why the grant was made.
    pub note: Option<String>,
}

/// Lists a user's grants with both remainders, FIFO-by-expiry ordered.
async fn list_grants(State(state): State<AppState>, Query(query): Query<GrantListQuery>) -> Response {
    let as_of = query.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let repo = GrantRepository::new(state.db.clone());

    match repo
        .list_with_remaining(query.user_id, query.leave_type_id, as_of)
        .await
    {
        Ok(grants) => (
            StatusCode::OK,
            Json(json!({
                "grants": grants
                    .iter()
                    .map(|g| json!({
                        "id": g.grant.id,
                        "leave_type_id": g.grant.leave_type_id,
                        "quantity_hours": g.grant.quantity_hours,
                        "granted_on": g.grant.granted_on,
                        "expires_on": g.grant.expires_on,
                        "remaining_confirmed": g.remaining_confirmed,
                        "remaining_including_holds": g.remaining_including_holds,
                        "is_expired": g.is_expired,
                    }))
                    .collect::<Vec<_>>(),
            })),
        )
            .into_response(),
        Err(e) => grant_error_response(&e),
    }
}

/// Inserts a manual/back-fill grant.
async fn create_grant(
    State(state): State<AppState>,
    Json(body): Json<CreateGrantRequest>,
) -> Response {
    let repo = GrantRepository::new(state.db.clone());
    let result = repo
        .create_manual_grant(ManualGrantInput {
            company_id: body.company_id,
            user_id: body.user_id,
            leave_type_id: body.leave_type_id,
            quantity_hours: body.quantity_hours,
            granted_on: body.granted_on,
            expires_on: body.expires_on,
            note: body.note,
        })
        .await;

    match result {
        Ok(grant) => (
            StatusCode::CREATED,
            Json(json!({
                "id": grant.id,
                "quantity_hours": grant.quantity_hours,
                "granted_on": grant.granted_on,
                "expires_on": grant.expires_on,
            })),
        )
            .into_response(),
        Err(e) => grant_error_response(&e),
    }
}

fn grant_error_response(err: &GrantRepoError) -> Response {
    match err {
        GrantRepoError::InvalidQuantity(_) | GrantRepoError::InvalidExpiry { .. } => {
            error_response(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", &err.to_string())
        }
        GrantRepoError::Database(e) => {
            tracing::error!(error = %e, "grant operation failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "Grant operation failed",
            )
        }
    }
}

/// Creates grant routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/grants", get(list_grants).post(create_grant))
}
