//! Allocation domain types.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use recess_shared::types::GrantId;

/// A grant line as seen by the planner: identity, ordering keys, and the
/// hours still available on it under the policy's deduction timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateGrant {
    /// The grant's identity.
    pub id: GrantId,
    /// The grant date (FIFO tie-break).
    pub granted_on: NaiveDate,
    /// The expiry date; `None` never expires and is consumed last.
    pub expires_on: Option<NaiveDate>,
    /// Hours still available on this grant.
    pub available_hours: Decimal,
}

impl CandidateGrant {
    /// Returns true when the grant can no longer be allocated against on
    /// `as_of`. A grant is usable through its expiry date inclusive.
    #[must_use]
    pub fn is_expired(&self, as_of: NaiveDate) -> bool {
        matches!(self.expires_on, Some(expiry) if expiry < as_of)
    }
}

/// One planned consumption row: `hours` taken from `grant_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedConsumption {
    /// The grant being consumed.
    pub grant_id: GrantId,
    /// Hours to consume; always positive.
    pub hours: Decimal,
}

/// The full output of one planning call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationPlan {
    /// Consumption rows in the order they were planned.
    pub consumptions: Vec<PlannedConsumption>,
    /// Hours beyond total availability, charged to the last grant; positive
    /// only when the policy allows negative balances.
    pub shortfall: Decimal,
}

impl AllocationPlan {
    /// Total planned hours across all rows.
    #[must_use]
    pub fn total_hours(&self) -> Decimal {
        self.consumptions.iter().map(|c| c.hours).sum()
    }
}
