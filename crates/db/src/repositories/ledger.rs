//! Leave ledger repository: allocation, the hold/confirm/release/reverse
//! lifecycle, and the derived balance views.
//!
//! Every mutating operation is one database transaction. The candidate
//! grant rows are locked `FOR UPDATE` before availability is computed, so
//! two concurrent allocations for one user serialize instead of both
//! observing stale availability and over-consuming a grant.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

use recess_core::allocation::{
    AllocationError, CandidateGrant, LedgerState, PlannedConsumption, ensure_can_allocate,
    ensure_can_confirm, ensure_can_release, ensure_can_reverse, plan_allocation,
};
use recess_core::balance::{GrantSummary, LeaveBalance, balance_from_summaries};
use recess_core::policy::{DeductionTiming, LeavePolicy};
use recess_core::rounding::{RoundingError, round_to_min_unit_hours};
use recess_shared::types::GrantId;

use crate::entities::sea_orm_active_enums::ConsumptionKind;
use crate::entities::{leave_consumptions, leave_grants};

use super::audit::{AuditEntry, AuditRepository};
use super::grant::{load_grant_summaries, summarize_grants};
use super::policy::{self, PolicyRepoError};

/// Error types for ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// No active policy for the leave type.
    #[error("No active policy for leave type {0}")]
    PolicyNotFound(Uuid),

    /// Company not found.
    #[error("Company not found: {0}")]
    CompanyNotFound(Uuid),

    /// Stored policy configuration cannot be used.
    #[error("Policy configuration error: {0}")]
    PolicyConfig(String),

    /// A manually named grant does not exist.
    #[error("Grant not found: {0}")]
    GrantNotFound(Uuid),

    /// A manually named grant belongs to another user or leave type.
    #[error("Grant {0} does not belong to the request's user and leave type")]
    ForeignGrant(Uuid),

    /// Unit or duration validation failed before any write.
    #[error(transparent)]
    Rounding(#[from] RoundingError),

    /// Planning or lifecycle validation failed; nothing was written.
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    /// Lock or serialization failure; retry the whole operation.
    #[error("Concurrent ledger modification detected, please retry")]
    ConcurrencyConflict,

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl From<DbErr> for LedgerError {
    fn from(err: DbErr) -> Self {
        let msg = err.to_string();
        if msg.contains("could not serialize access")
            || msg.contains("deadlock detected")
            || msg.contains("lock not available")
        {
            Self::ConcurrencyConflict
        } else {
            Self::Database(msg)
        }
    }
}

impl From<PolicyRepoError> for LedgerError {
    fn from(err: PolicyRepoError) -> Self {
        match err {
            PolicyRepoError::NotFound(id) => Self::PolicyNotFound(id),
            PolicyRepoError::CompanyNotFound(id) => Self::CompanyNotFound(id),
            PolicyRepoError::Corrupt { .. } | PolicyRepoError::Invalid { .. } => {
                Self::PolicyConfig(err.to_string())
            }
            PolicyRepoError::Database(e) => e.into(),
        }
    }
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PolicyNotFound(_) => "POLICY_NOT_FOUND",
            Self::CompanyNotFound(_) => "COMPANY_NOT_FOUND",
            Self::PolicyConfig(_) => "POLICY_CONFIG_ERROR",
            Self::GrantNotFound(_) => "GRANT_NOT_FOUND",
            Self::ForeignGrant(_) => "FOREIGN_GRANT",
            Self::Rounding(RoundingError::InvalidUnit(_)) => "INVALID_UNIT",
            Self::Rounding(RoundingError::ZeroDurationLine { .. }) => "ZERO_DURATION_LINE",
            Self::Allocation(inner) => inner.error_code(),
            Self::ConcurrencyConflict => "CONCURRENCY_CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::PolicyNotFound(_) | Self::CompanyNotFound(_) | Self::GrantNotFound(_) => 404,
            Self::ForeignGrant(_) | Self::Rounding(_) => 400,
            Self::Allocation(inner) => inner.http_status_code(),
            Self::ConcurrencyConflict => 409,
            Self::PolicyConfig(_) | Self::Database(_) => 500,
        }
    }

    /// Returns true if the caller should retry the operation unchanged.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict)
    }
}

/// One needed quantity of hours on one date.
#[derive(Debug, Clone)]
pub struct NeedLine {
    /// The date the leave is taken on.
    pub date: NaiveDate,
    /// Needed hours; rounded to the policy minimum unit before planning.
    pub hours: Decimal,
}

/// Input for an allocation call.
#[derive(Debug, Clone)]
pub struct AllocateInput {
    /// The company scope.
    pub company_id: Uuid,
    /// The requesting employee.
    pub user_id: Uuid,
    /// The leave type being consumed.
    pub leave_type_id: Uuid,
    /// The owning leave request; all rows of this call share it.
    pub request_id: Uuid,
    /// Needed hours per date.
    pub needs: Vec<NeedLine>,
    /// Whether the rows are tentative holds or confirmed from birth.
    pub is_hold: bool,
    /// Administrative override: consume exactly these grants in this order.
    pub manual_grant_ids: Option<Vec<Uuid>>,
    /// Optional note carried on every row.
    pub note: Option<String>,
}

/// Balance views for one leave type.
#[derive(Debug, Clone)]
pub struct LeaveTypeBalance {
    /// The leave type.
    pub leave_type_id: Uuid,
    /// The two balance views.
    pub balance: LeaveBalance,
}

/// Repository for the allocation lifecycle and balance views.
#[derive(Debug, Clone)]
pub struct LeaveLedgerRepository {
    db: DatabaseConnection,
}

impl LeaveLedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Allocates consumption rows for a request, FIFO-by-expiry.
    ///
    /// The whole call is one transaction: on any failure nothing is
    /// persisted. All rows share the request ID and the hold flag.
    ///
    /// # Errors
    ///
    /// `ZeroDurationLine` before any write, `InsufficientBalance` when
    /// availability cannot cover the need and negatives are off,
    /// `InvalidLedgerState` when the request already has rows.
    pub async fn allocate(&self, input: AllocateInput) -> Result<(), LedgerError> {
        let request_id = input.request_id;
        let company_id = input.company_id;
        match self.allocate_inner(input).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.audit_failure(Some(company_id), "leave.allocate", request_id, &e)
                    .await;
                Err(e)
            }
        }
    }

    async fn allocate_inner(&self, input: AllocateInput) -> Result<(), LedgerError> {
        if input.needs.is_empty() {
            return Err(AllocationError::NothingRequested.into());
        }

        let alloc_policy =
            policy::load_active_policy(&self.db, input.company_id, input.leave_type_id).await?;

        // Validate and round every line before touching the ledger.
        let mut lines: Vec<(NaiveDate, Decimal)> = Vec::with_capacity(input.needs.len());
        for (index, need) in input.needs.iter().enumerate() {
            let hours = round_to_min_unit_hours(
                need.hours,
                alloc_policy.min_unit,
                alloc_policy.hours_per_day,
            );
            if hours <= Decimal::ZERO {
                return Err(RoundingError::ZeroDurationLine { line: index }.into());
            }
            lines.push((need.date, hours));
        }
        let total_needed: Decimal = lines.iter().map(|(_, h)| *h).sum();

        let txn = self.db.begin().await?;

        let existing = request_rows(&txn, input.request_id).await?;
        ensure_can_allocate(state_of(&existing))?;

        let mut candidates = self.candidate_grants(&txn, &input, &alloc_policy).await?;

        let first_date = lines.iter().map(|(d, _)| *d).min().unwrap_or_default();
        let initial_available: Decimal = candidates
            .iter()
            .filter(|c| input.manual_grant_ids.is_some() || !c.is_expired(first_date))
            .map(|c| c.available_hours.max(Decimal::ZERO))
            .sum();

        let manual = input.manual_grant_ids.is_some();
        let mut planned_rows: Vec<(NaiveDate, PlannedConsumption)> = Vec::new();
        for (date, hours) in &lines {
            let line_candidates: Vec<CandidateGrant> = if manual {
                candidates.clone()
            } else {
                candidates
                    .iter()
                    .filter(|c| !c.is_expired(*date))
                    .cloned()
                    .collect()
            };

            let plan = plan_allocation(
                line_candidates,
                *hours,
                *date,
                alloc_policy.allow_negative,
                manual,
            )
            .map_err(|e| match e {
                // Report the whole request's shortfall, not one line's.
                AllocationError::InsufficientBalance { .. } => {
                    AllocationError::InsufficientBalance {
                        needed: total_needed,
                        available: initial_available,
                    }
                }
                other => other,
            })?;

            for row in plan.consumptions {
                if let Some(candidate) = candidates.iter_mut().find(|c| c.id == row.grant_id) {
                    candidate.available_hours -= row.hours;
                }
                planned_rows.push((*date, row));
            }
        }

        let now = Utc::now();
        for (date, row) in &planned_rows {
            let model = leave_consumptions::ActiveModel {
                id: Set(Uuid::new_v4()),
                grant_id: Set(row.grant_id.into_inner()),
                request_id: Set(Some(input.request_id)),
                kind: Set(ConsumptionKind::Request),
                quantity_hours: Set(row.hours),
                is_hold: Set(input.is_hold),
                consumed_on: Set(*date),
                note: Set(input.note.clone()),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            };
            model.insert(&txn).await?;
        }

        AuditRepository::record(
            &txn,
            AuditEntry::new(
                Some(input.company_id),
                "leave.allocate",
                "leave_request",
                input.request_id.to_string(),
            )
            .after(json!({
                "is_hold": input.is_hold,
                "rows": planned_rows
                    .iter()
                    .map(|(date, row)| json!({
                        "grant_id": row.grant_id,
                        "date": date,
                        "hours": row.hours,
                    }))
                    .collect::<Vec<_>>(),
            }))
            .details(json!({
                "user_id": input.user_id,
                "leave_type_id": input.leave_type_id,
                "needed_hours": total_needed,
                "manual": manual,
            })),
        )
        .await?;

        txn.commit().await?;

        tracing::info!(
            request_id = %input.request_id,
            hours = %total_needed,
            is_hold = input.is_hold,
            "allocated leave consumption"
        );
        Ok(())
    }

    /// Flips every hold row of a request to confirmed.
    ///
    /// # Errors
    ///
    /// `InvalidLedgerState` unless the request is entirely on hold.
    pub async fn confirm(&self, request_id: Uuid) -> Result<(), LedgerError> {
        match self.confirm_inner(request_id).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.audit_failure(None, "leave.confirm", request_id, &e).await;
                Err(e)
            }
        }
    }

    async fn confirm_inner(&self, request_id: Uuid) -> Result<(), LedgerError> {
        let txn = self.db.begin().await?;
        let rows = locked_request_rows(&txn, request_id).await?;
        ensure_can_confirm(state_of(&rows))?;

        let before = rows_json(&rows);
        let now = Utc::now();
        for row in rows {
            let mut active: leave_consumptions::ActiveModel = row.into();
            active.is_hold = Set(false);
            active.updated_at = Set(now.into());
            active.update(&txn).await?;
        }

        AuditRepository::record(
            &txn,
            AuditEntry::new(None, "leave.confirm", "leave_request", request_id.to_string())
                .before(before)
                .details(json!({ "transition": "hold -> confirmed" })),
        )
        .await?;

        txn.commit().await?;
        tracing::info!(request_id = %request_id, "confirmed leave request");
        Ok(())
    }

    /// Deletes every hold row of a request; confirmed rows are untouched.
    ///
    /// # Errors
    ///
    /// `InvalidLedgerState` unless the request is entirely on hold.
    pub async fn release(&self, request_id: Uuid) -> Result<(), LedgerError> {
        match self.release_inner(request_id).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.audit_failure(None, "leave.release", request_id, &e).await;
                Err(e)
            }
        }
    }

    async fn release_inner(&self, request_id: Uuid) -> Result<(), LedgerError> {
        let txn = self.db.begin().await?;
        let rows = locked_request_rows(&txn, request_id).await?;
        ensure_can_release(state_of(&rows))?;

        let before = rows_json(&rows);
        leave_consumptions::Entity::delete_many()
            .filter(leave_consumptions::Column::RequestId.eq(request_id))
            .filter(leave_consumptions::Column::IsHold.eq(true))
            .exec(&txn)
            .await?;

        AuditRepository::record(
            &txn,
            AuditEntry::new(None, "leave.release", "leave_request", request_id.to_string())
                .before(before)
                .details(json!({ "transition": "hold -> none" })),
        )
        .await?;

        txn.commit().await?;
        tracing::info!(request_id = %request_id, "released leave hold");
        Ok(())
    }

    /// Deletes every confirmed row of a request, restoring the
    /// pre-confirmation balance. Used when an approved leave is cancelled.
    ///
    /// # Errors
    ///
    /// `InvalidLedgerState` unless the request is entirely confirmed.
    pub async fn reverse(&self, request_id: Uuid, reason: &str) -> Result<(), LedgerError> {
        match self.reverse_inner(request_id, reason).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.audit_failure(None, "leave.reverse", request_id, &e).await;
                Err(e)
            }
        }
    }

    async fn reverse_inner(&self, request_id: Uuid, reason: &str) -> Result<(), LedgerError> {
        let txn = self.db.begin().await?;
        let rows = locked_request_rows(&txn, request_id).await?;
        ensure_can_reverse(state_of(&rows))?;

        let before = rows_json(&rows);
        leave_consumptions::Entity::delete_many()
            .filter(leave_consumptions::Column::RequestId.eq(request_id))
            .exec(&txn)
            .await?;

        AuditRepository::record(
            &txn,
            AuditEntry::new(None, "leave.reverse", "leave_request", request_id.to_string())
                .before(before)
                .details(json!({ "transition": "confirmed -> none", "reason": reason })),
        )
        .await?;

        txn.commit().await?;
        tracing::info!(request_id = %request_id, reason, "reversed confirmed leave");
        Ok(())
    }

    /// Computes the two balance views per leave type for a user.
    ///
    /// `as_of` defaults to today in the company's timezone. Expired grants
    /// are excluded from the forward-looking balances.
    ///
    /// # Errors
    ///
    /// `CompanyNotFound` when the company row is missing.
    pub async fn get_balance(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        leave_type_id: Option<Uuid>,
        as_of: Option<NaiveDate>,
    ) -> Result<Vec<LeaveTypeBalance>, LedgerError> {
        let as_of = match as_of {
            Some(date) => date,
            None => {
                let company = crate::entities::companies::Entity::find_by_id(company_id)
                    .one(&self.db)
                    .await?
                    .ok_or(LedgerError::CompanyNotFound(company_id))?;
                policy::company_today(&company)
            }
        };

        let rows = load_grant_summaries(&self.db, user_id, leave_type_id, false).await?;

        let mut by_type: std::collections::BTreeMap<Uuid, Vec<GrantSummary>> =
            std::collections::BTreeMap::new();
        for (model, summary) in rows {
            by_type.entry(model.leave_type_id).or_default().push(summary);
        }

        Ok(by_type
            .into_iter()
            .map(|(leave_type_id, summaries)| LeaveTypeBalance {
                leave_type_id,
                balance: balance_from_summaries(&summaries, as_of),
            })
            .collect())
    }

    /// Records a failed mutating operation in the audit log, outside the
    /// rolled-back transaction. Best-effort: an audit write failure is
    /// logged but never masks the original error.
    async fn audit_failure(
        &self,
        company_id: Option<Uuid>,
        action: &str,
        request_id: Uuid,
        err: &LedgerError,
    ) {
        let entry = AuditEntry::new(
            company_id,
            format!("{action}.failed"),
            "leave_request",
            request_id.to_string(),
        )
        .details(json!({
            "error": err.error_code(),
            "message": err.to_string(),
        }));

        if let Err(audit_err) = AuditRepository::record(&self.db, entry).await {
            tracing::warn!(
                error = %audit_err,
                request_id = %request_id,
                "failed to record audit row for failed operation"
            );
        }
    }

    /// Loads and locks the candidate grants for an allocation, computing
    /// each one's availability under the policy's deduction timing.
    async fn candidate_grants(
        &self,
        txn: &DatabaseTransaction,
        input: &AllocateInput,
        alloc_policy: &LeavePolicy,
    ) -> Result<Vec<CandidateGrant>, LedgerError> {
        let summaries = match &input.manual_grant_ids {
            Some(ids) => {
                let models = leave_grants::Entity::find()
                    .filter(leave_grants::Column::Id.is_in(ids.clone()))
                    .lock_exclusive()
                    .all(txn)
                    .await?;

                for id in ids {
                    let Some(model) = models.iter().find(|m| m.id == *id) else {
                        return Err(LedgerError::GrantNotFound(*id));
                    };
                    if model.user_id != input.user_id
                        || model.leave_type_id != input.leave_type_id
                    {
                        return Err(LedgerError::ForeignGrant(*id));
                    }
                }

                // Preserve caller order: it is authoritative for overrides.
                let mut summaries = summarize_grants(txn, models).await?;
                summaries.sort_by_key(|(model, _)| {
                    ids.iter().position(|id| *id == model.id).unwrap_or(usize::MAX)
                });
                summaries
            }
            None => {
                load_grant_summaries(txn, input.user_id, Some(input.leave_type_id), true).await?
            }
        };

        Ok(summaries
            .into_iter()
            .map(|(model, summary)| {
                let counted = match alloc_policy.deduction_timing {
                    DeductionTiming::Apply => {
                        summary.confirmed_consumed + summary.held_consumed
                    }
                    DeductionTiming::Approve => summary.confirmed_consumed,
                };
                CandidateGrant {
                    id: GrantId::from_uuid(model.id),
                    granted_on: model.granted_on,
                    expires_on: model.expires_on,
                    available_hours: model.quantity_hours - counted,
                }
            })
            .collect())
    }
}

/// Loads a request's consumption rows without locks.
async fn request_rows<C: ConnectionTrait>(
    conn: &C,
    request_id: Uuid,
) -> Result<Vec<leave_consumptions::Model>, DbErr> {
    leave_consumptions::Entity::find()
        .filter(leave_consumptions::Column::RequestId.eq(request_id))
        .all(conn)
        .await
}

/// Loads a request's rows after locking their owning grants, then re-reads
/// so the returned state is stable for the rest of the transaction.
async fn locked_request_rows(
    txn: &DatabaseTransaction,
    request_id: Uuid,
) -> Result<Vec<leave_consumptions::Model>, LedgerError> {
    let rows = request_rows(txn, request_id).await?;
    let grant_ids: Vec<Uuid> = rows.iter().map(|r| r.grant_id).collect();
    if !grant_ids.is_empty() {
        leave_grants::Entity::find()
            .filter(leave_grants::Column::Id.is_in(grant_ids))
            .lock_exclusive()
            .all(txn)
            .await?;
    }
    Ok(request_rows(txn, request_id).await?)
}

/// Derives the lifecycle state from a request's rows.
fn state_of(rows: &[leave_consumptions::Model]) -> LedgerState {
    let holds = rows.iter().filter(|r| r.is_hold).count();
    let confirmed = rows.len() - holds;
    LedgerState::from_counts(holds, confirmed)
}

/// JSON snapshot of rows for audit before-data.
fn rows_json(rows: &[leave_consumptions::Model]) -> serde_json::Value {
    json!(
        rows.iter()
            .map(|r| json!({
                "id": r.id,
                "grant_id": r.grant_id,
                "hours": r.quantity_hours,
                "is_hold": r.is_hold,
                "consumed_on": r.consumed_on,
            }))
            .collect::<Vec<_>>()
    )
}
