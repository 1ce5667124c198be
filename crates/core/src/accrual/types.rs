//! Accrual domain types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use recess_shared::types::{CompanyId, LeavePolicyId, LeaveTypeId, UserId};

/// The slice of an employee record the accrual engine needs.
#[derive(Debug, Clone)]
pub struct EmployeeProfile {
    /// The employee's user ID.
    pub user_id: UserId,
    /// Date the employee became eligible for leave accrual (usually the
    /// hire date, possibly shifted by a probation period).
    pub eligible_from: NaiveDate,
    /// Full-time-equivalent ratio; `1` for full-time staff.
    pub fte_ratio: Decimal,
}

/// A grant the engine has decided to issue.
///
/// Directives are pure values; persisting one (exactly once) is the
/// repository's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantDirective {
    /// The receiving employee.
    pub user_id: UserId,
    /// The company the grant belongs to.
    pub company_id: CompanyId,
    /// The leave type being granted.
    pub leave_type_id: LeaveTypeId,
    /// The policy that produced the grant.
    pub policy_id: LeavePolicyId,
    /// Granted quantity in hours, already rounded to the policy minimum unit.
    pub quantity_hours: Decimal,
    /// The grant date.
    pub granted_on: NaiveDate,
    /// The expiry date.
    pub expires_on: Option<NaiveDate>,
}

/// A failure while processing one (policy, employee) target.
///
/// Collected into the run summary; one bad target never aborts the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccrualTargetError {
    /// The employee the failure concerns, when known.
    pub user_id: Option<UserId>,
    /// The policy being processed, when known.
    pub policy_id: Option<LeavePolicyId>,
    /// Human-readable failure description.
    pub message: String,
}

/// Outcome of one accrual run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccrualRunSummary {
    /// Number of grants inserted.
    pub granted: usize,
    /// Number of targets skipped (not due, zero quantity, or already granted).
    pub skipped: usize,
    /// Per-target failures.
    pub errors: Vec<AccrualTargetError>,
}

impl AccrualRunSummary {
    /// Merges another summary into this one.
    pub fn absorb(&mut self, other: Self) {
        self.granted += other.granted;
        self.skipped += other.skipped;
        self.errors.extend(other.errors);
    }
}
