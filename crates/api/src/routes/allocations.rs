//! Allocation endpoint: turns user-entered request lines into consumption
//! rows against the grant ledger.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::post};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use recess_core::rounding::{LeaveUnit, normalize_to_hours};
use recess_db::repositories::{
    AllocateInput, LeaveLedgerRepository, NeedLine, PolicyRepository,
};

use super::{error_response, ledger_error_response};
use crate::AppState;

/// One user-entered request line.
#[derive(Debug, Deserialize)]
pub struct AllocationLine {
    /// The date the leave is taken on.
    pub date: NaiveDate,
    /// The unit the quantity is expressed in.
    pub unit: LeaveUnit,
    /// The quantity in the given unit.
    pub quantity: Decimal,
}

/// Request body for an allocation.
#[derive(Debug, Deserialize)]
pub struct AllocateRequest {
    /// The company scope.
    pub company_id: Uuid,
    /// The requesting employee.
    pub user_id: Uuid,
    /// The leave type being consumed.
    pub leave_type_id: Uuid,
    /// The owning leave request.
    pub request_id: Uuid,
    /// Request lines in user-entered units.
    pub lines: Vec<AllocationLine>,
    /// Tentative hold (request time) or confirmed (approval-time deduction).
    pub is_hold: bool,
    /// Administrative override: consume exactly these grants in this order.
    pub manual_grant_ids: Option<Vec<Uuid>>,
    /// Optional note carried on every row.
    pub note: Option<String>,
}

/// Allocates consumption for a leave request.
async fn allocate(State(state): State<AppState>, Json(body): Json<AllocateRequest>) -> Response {
    if body.lines.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "At least one request line is required",
        );
    }

    let policy_repo = PolicyRepository::new(state.db.clone());
    let policy = match policy_repo.find_active(body.company_id, body.leave_type_id).await {
        Ok(p) => p,
        Err(e) => return ledger_error_response(&e.into()),
    };

    // The requested range must contain at least one working day.
    let company = match policy_repo.company(body.company_id).await {
        Ok(c) => c,
        Err(e) => return ledger_error_response(&e.into()),
    };
    let calendar = match policy_repo.business_calendar(&company, &policy).await {
        Ok(c) => c,
        Err(e) => return ledger_error_response(&e.into()),
    };
    if !body.lines.iter().any(|l| calendar.is_business_day(l.date)) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "Requested range contains no working day",
        );
    }

    let needs: Vec<NeedLine> = body
        .lines
        .iter()
        .filter(|line| calendar.is_business_day(line.date))
        .map(|line| NeedLine {
            date: line.date,
            hours: normalize_to_hours(line.unit, line.quantity, policy.hours_per_day),
        })
        .collect();

    let ledger = LeaveLedgerRepository::new(state.db.clone());
    let result = ledger
        .allocate(AllocateInput {
            company_id: body.company_id,
            user_id: body.user_id,
            leave_type_id: body.leave_type_id,
            request_id: body.request_id,
            needs,
            is_hold: body.is_hold,
            manual_grant_ids: body.manual_grant_ids,
            note: body.note,
        })
        .await;

    match result {
        Ok(()) => (StatusCode::CREATED, Json(json!({ "allocated": true }))).into_response(),
        Err(e) => ledger_error_response(&e),
    }
}

/// Creates allocation routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/allocations", post(allocate))
}
