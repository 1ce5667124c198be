//! Leave accrual policy types and validation.

pub mod error;
pub mod types;

pub use error::PolicyError;
pub use types::{AccrualMethod, DeductionTiming, LeavePolicy, ServiceBand};
