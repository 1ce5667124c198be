//! Repository abstractions for the leave ledger.
//!
//! Every mutating operation runs inside a database transaction and writes
//! its audit row before committing. Row-level locks on the grant rows
//! serialize concurrent allocations for one user.

pub mod accrual;
pub mod audit;
pub mod grant;
pub mod ledger;
pub mod policy;

pub use accrual::{AccrualRepository, AccrualRunError};
pub use audit::{AuditEntry, AuditRepository};
pub use grant::{GrantRepoError, GrantRepository, GrantWithRemaining, ManualGrantInput};
pub use ledger::{AllocateInput, LeaveLedgerRepository, LedgerError, LeaveTypeBalance, NeedLine};
pub use policy::{PolicyRepoError, PolicyRepository};
