//! Accrual scheduling and grant computation.
//!
//! The accrual engine decides, per (policy, employee, as-of date), whether a
//! grant is due and how large it is. Everything here is pure; the database
//! layer feeds employee profiles in and persists the resulting directives
//! under the idempotency constraint.

pub mod engine;
pub mod schedule;
pub mod types;

pub use engine::{carryover_excess_hours, evaluate_grant};
pub use schedule::{add_months_clamped, completed_service_years, grant_due_on};
pub use types::{AccrualRunSummary, AccrualTargetError, EmployeeProfile, GrantDirective};
