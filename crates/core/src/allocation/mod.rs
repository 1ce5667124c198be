//! FIFO-by-expiry allocation planning and request lifecycle.
//!
//! The planner is pure: it receives candidate grants with their current
//! availability and produces the consumption rows a request needs, or fails
//! without side effects. The database layer wraps the plan in a transaction
//! with row locks and persists it atomically.

pub mod error;
pub mod lifecycle;
pub mod planner;
pub mod types;

#[cfg(test)]
mod planner_props;

pub use error::AllocationError;
pub use lifecycle::{
    LedgerState, ensure_can_allocate, ensure_can_confirm, ensure_can_release, ensure_can_reverse,
};
pub use planner::{fifo_order, plan_allocation};
pub use types::{AllocationPlan, CandidateGrant, PlannedConsumption};
