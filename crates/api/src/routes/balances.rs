//! Balance view endpoints.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::get};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use recess_db::repositories::LeaveLedgerRepository;

use super::ledger_error_response;
use crate::AppState;

/// Query parameters for a balance read.
#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    /// The company scope.
    pub company_id: Uuid,
    /// The employee whose balance is read.
    pub user_id: Uuid,
    /// Restrict to one leave type.
    pub leave_type_id: Option<Uuid>,
    /// Expiry cutoff; defaults to today in the company's timezone.
    pub as_of: Option<NaiveDate>,
}

/// Returns the confirmed and including-holds balances per leave type.
async fn get_balance(State(state): State<AppState>, Query(query): Query<BalanceQuery>) -> Response {
    let ledger = LeaveLedgerRepository::new(state.db.clone());
    match ledger
        .get_balance(query.company_id, query.user_id, query.leave_type_id, query.as_of)
        .await
    {
        Ok(balances) => (
            StatusCode::OK,
            Json(json!({
                "balances": balances
                    .iter()
                    .map(|b| json!({
                        "leave_type_id": b.leave_type_id,
                        "remaining_confirmed": b.balance.remaining_confirmed,
                        "remaining_including_holds": b.balance.remaining_including_holds,
                    }))
                    .collect::<Vec<_>>(),
            })),
        )
            .into_response(),
        Err(e) => ledger_error_response(&e),
    }
}

/// Creates balance routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/balances", get(get_balance))
}
