//! Accrual repository: the scheduled grant-issuance run.
//!
//! One run walks every active policy of every (or one) company, asks the
//! pure engine whether each employee is due a grant on the as-of date, and
//! persists each due grant in its own transaction. A partial unique index
//! on (user, leave type, grant date) makes issuance idempotent: re-runs and
//! concurrent duplicate triggers surface as `skipped`, never as double
//! grants. A failure for one target is collected into the run summary and
//! never aborts the rest of the run.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

use recess_core::accrual::{
    AccrualRunSummary, AccrualTargetError, GrantDirective, carryover_excess_hours, evaluate_grant,
};
use recess_core::allocation::{CandidateGrant, plan_allocation};
use recess_core::policy::LeavePolicy;
use recess_shared::types::LeavePolicyId;

use crate::entities::sea_orm_active_enums::ConsumptionKind;
use crate::entities::{leave_consumptions, leave_grants, leave_policies};

use super::audit::{AuditEntry, AuditRepository};
use super::grant::load_grant_summaries;
use super::ledger::LedgerError;
use super::policy::{self, PolicyRepoError, PolicyRepository};

/// Fatal errors for a whole accrual run. Per-target failures are collected
/// into the summary instead.
#[derive(Debug, thiserror::Error)]
pub enum AccrualRunError {
    /// The requested company does not exist.
    #[error("Company not found: {0}")]
    CompanyNotFound(Uuid),

    /// Database error while enumerating run targets.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Outcome of persisting one grant directive.
enum IssueOutcome {
    Granted,
    Skipped,
}

/// Repository driving scheduled grant issuance.
#[derive(Debug, Clone)]
pub struct AccrualRepository {
    db: DatabaseConnection,
}

impl AccrualRepository {
    /// Creates a new accrual repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Runs grant issuance for the as-of date (default: today in each
    /// company's timezone), optionally scoped to one company.
    ///
    /// # Errors
    ///
    /// Only setup failures (unknown company, broken connection) abort the
    /// run; everything else lands in the summary's error list.
    pub async fn issue_grants(
        &self,
        as_of: Option<NaiveDate>,
        company_id: Option<Uuid>,
    ) -> Result<AccrualRunSummary, AccrualRunError> {
        let policy_repo = PolicyRepository::new(self.db.clone());
        let companies = policy_repo.companies(company_id).await.map_err(|e| match e {
            PolicyRepoError::CompanyNotFound(id) => AccrualRunError::CompanyNotFound(id),
            PolicyRepoError::Database(db) => AccrualRunError::Database(db),
            other => AccrualRunError::Database(DbErr::Custom(other.to_string())),
        })?;

        let mut summary = AccrualRunSummary::default();

        for company in companies {
            let run_date = as_of.unwrap_or_else(|| policy::company_today(&company));
            let company_summary = self
                .run_company(&policy_repo, &company, run_date)
                .await?;

            tracing::info!(
                company_id = %company.id,
                %run_date,
                granted = company_summary.granted,
                skipped = company_summary.skipped,
                errors = company_summary.errors.len(),
                "accrual run finished for company"
            );

            AuditRepository::record(
                &self.db,
                AuditEntry::new(
                    Some(company.id),
                    "leave.accrual.run",
                    "accrual_run",
                    run_date.to_string(),
                )
                .details(json!({
                    "granted": company_summary.granted,
                    "skipped": company_summary.skipped,
                    "errors": &company_summary.errors,
                })),
            )
            .await?;

            summary.absorb(company_summary);
        }

        Ok(summary)
    }

    /// Processes every active policy of one company.
    async fn run_company(
        &self,
        policy_repo: &PolicyRepository,
        company: &crate::entities::companies::Model,
        run_date: NaiveDate,
    ) -> Result<AccrualRunSummary, AccrualRunError> {
        let mut summary = AccrualRunSummary::default();

        let policy_models = leave_policies::Entity::find()
            .filter(leave_policies::Column::CompanyId.eq(company.id))
            .filter(leave_policies::Column::IsActive.eq(true))
            .all(&self.db)
            .await?;
        let employees = policy_repo.active_employees(company.id).await?;

        for policy_model in &policy_models {
            let core_policy = match policy::to_core_policy(policy_model) {
                Ok(p) => p,
                Err(e) => {
                    // A broken policy is isolated; the rest still run.
                    summary.errors.push(AccrualTargetError {
                        user_id: None,
                        policy_id: Some(LeavePolicyId::from_uuid(policy_model.id)),
                        message: e.to_string(),
                    });
                    continue;
                }
            };
            let calendar = match policy_repo.business_calendar(company, &core_policy).await {
                Ok(c) => c,
                Err(e) => {
                    summary.errors.push(AccrualTargetError {
                        user_id: None,
                        policy_id: Some(core_policy.id),
                        message: format!("calendar load failed: {e}"),
                    });
                    continue;
                }
            };

            let mut policy_summary = AccrualRunSummary::default();
            for employee in &employees {
                match evaluate_grant(&core_policy, employee, run_date, &calendar) {
                    None => policy_summary.skipped += 1,
                    Some(directive) => {
                        match self.persist_directive(&core_policy, &directive).await {
                            Ok(IssueOutcome::Granted) => policy_summary.granted += 1,
                            Ok(IssueOutcome::Skipped) => policy_summary.skipped += 1,
                            Err(e) => policy_summary.errors.push(AccrualTargetError {
                                user_id: Some(employee.user_id),
                                policy_id: Some(core_policy.id),
                                message: e.to_string(),
                            }),
                        }
                    }
                }
            }

            tracing::debug!(
                policy_id = %core_policy.id,
                granted = policy_summary.granted,
                skipped = policy_summary.skipped,
                errors = policy_summary.errors.len(),
                "policy processed"
            );
            summary.absorb(policy_summary);
        }

        Ok(summary)
    }

    /// Persists one grant directive in its own transaction.
    ///
    /// Idempotency: an existing engine grant for (user, leave type, date)
    /// is reported as `Skipped`; so is a unique-index violation raised by a
    /// concurrent duplicate run.
    async fn persist_directive(
        &self,
        core_policy: &LeavePolicy,
        directive: &GrantDirective,
    ) -> Result<IssueOutcome, LedgerError> {
        let user_id = directive.user_id.into_inner();
        let leave_type_id = directive.leave_type_id.into_inner();

        let txn = self.db.begin().await?;

        let existing = leave_grants::Entity::find()
            .filter(leave_grants::Column::UserId.eq(user_id))
            .filter(leave_grants::Column::LeaveTypeId.eq(leave_type_id))
            .filter(leave_grants::Column::GrantedOn.eq(directive.granted_on))
            .filter(leave_grants::Column::PolicyId.is_not_null())
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Ok(IssueOutcome::Skipped);
        }

        // Carry-over basis: confirmed remaining hours on unexpired prior
        // grants, locked so a concurrent allocation cannot race the
        // forfeiture.
        let prior = load_grant_summaries(&txn, user_id, Some(leave_type_id), true).await?;
        let prior_remaining: Decimal = prior
            .iter()
            .filter(|(_, s)| !s.is_expired(directive.granted_on))
            .map(|(_, s)| s.remaining_confirmed())
            .sum();
        let excess = carryover_excess_hours(core_policy, prior_remaining);

        let now = Utc::now();
        let grant = leave_grants::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(directive.company_id.into_inner()),
            user_id: Set(user_id),
            leave_type_id: Set(leave_type_id),
            policy_id: Set(Some(directive.policy_id.into_inner())),
            quantity_hours: Set(directive.quantity_hours),
            granted_on: Set(directive.granted_on),
            expires_on: Set(directive.expires_on),
            note: Set(None),
            created_at: Set(now.into()),
        };
        let grant = match grant.insert(&txn).await {
            Ok(g) => g,
            Err(e) if is_unique_violation(&e) => return Ok(IssueOutcome::Skipped),
            Err(e) => return Err(e.into()),
        };

        if excess > Decimal::ZERO {
            self.forfeit_excess(&txn, &prior, directive, excess).await?;
        }

        AuditRepository::record(
            &txn,
            AuditEntry::new(
                Some(grant.company_id),
                "leave.grant.issue",
                "leave_grant",
                grant.id.to_string(),
            )
            .after(json!({
                "user_id": grant.user_id,
                "leave_type_id": grant.leave_type_id,
                "policy_id": grant.policy_id,
                "quantity_hours": grant.quantity_hours,
                "granted_on": grant.granted_on,
                "expires_on": grant.expires_on,
            }))
            .details(json!({ "forfeited_hours": excess })),
        )
        .await?;

        txn.commit().await?;
        Ok(IssueOutcome::Granted)
    }

    /// Writes confirmed forfeiture rows for hours above the carry-over cap,
    /// consuming soonest-expiring prior grants first.
    async fn forfeit_excess(
        &self,
        txn: &sea_orm::DatabaseTransaction,
        prior: &[(leave_grants::Model, recess_core::balance::GrantSummary)],
        directive: &GrantDirective,
        excess: Decimal,
    ) -> Result<(), LedgerError> {
        let candidates: Vec<CandidateGrant> = prior
            .iter()
            .filter(|(_, s)| !s.is_expired(directive.granted_on))
            .map(|(model, s)| CandidateGrant {
                id: recess_shared::types::GrantId::from_uuid(model.id),
                granted_on: model.granted_on,
                expires_on: model.expires_on,
                available_hours: s.remaining_confirmed(),
            })
            .collect();

        let plan = plan_allocation(candidates, excess, directive.granted_on, false, false)?;

        let now = Utc::now();
        for row in plan.consumptions {
            let model = leave_consumptions::ActiveModel {
                id: Set(Uuid::new_v4()),
                grant_id: Set(row.grant_id.into_inner()),
                request_id: Set(None),
                kind: Set(ConsumptionKind::Forfeit),
                quantity_hours: Set(row.hours),
                is_hold: Set(false),
                consumed_on: Set(directive.granted_on),
                note: Set(Some("carry-over forfeiture above cap".to_string())),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            };
            model.insert(txn).await?;
        }

        Ok(())
    }
}

/// Returns true for unique-constraint violations (duplicate engine grant).
fn is_unique_violation(err: &DbErr) -> bool {
    let msg = err.to_string();
    msg.contains("duplicate key") || msg.contains("uq_leave_grants_engine_issue")
}
