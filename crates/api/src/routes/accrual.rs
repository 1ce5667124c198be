//! Scheduler-invoked accrual run endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::post};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use recess_db::repositories::{AccrualRepository, AccrualRunError};

use super::error_response;
use crate::AppState;

/// Request body for an accrual run.
#[derive(Debug, Deserialize)]
pub struct RunAccrualRequest {
    /// Back-fill as-of date; defaults to today in each company's timezone.
    pub as_of: Option<NaiveDate>,
    /// Restrict the run to one company.
    pub company_id: Option<Uuid>,
}

/// Runs grant issuance for all (or one) company.
async fn run_accrual(
    State(state): State<AppState>,
    Json(body): Json<RunAccrualRequest>,
) -> Response {
    let repo = AccrualRepository::new(state.db.clone());
    match repo.issue_grants(body.as_of, body.company_id).await {
        Ok(summary) => (
            StatusCode::OK,
            Json(json!({
                "granted": summary.granted,
                "skipped": summary.skipped,
                "errors": summary.errors,
            })),
        )
            .into_response(),
        Err(AccrualRunError::CompanyNotFound(id)) => error_response(
            StatusCode::NOT_FOUND,
            "COMPANY_NOT_FOUND",
            &format!("Company not found: {id}"),
        ),
        Err(AccrualRunError::Database(e)) => {
            tracing::error!(error = %e, "accrual run failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "Accrual run failed",
            )
        }
    }
}

/// Creates accrual routes (scheduler-secret protected by the caller).
pub fn routes() -> Router<AppState> {
    Router::new().route("/accrual/runs", post(run_accrual))
}
