//! Allocation and request-lifecycle errors.

use rust_decimal::Decimal;
use thiserror::Error;

use recess_shared::types::GrantId;

use super::lifecycle::LedgerState;

/// Errors from planning an allocation or transitioning a request's ledger
/// footprint.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocationError {
    /// Total availability cannot cover the requirement and negative
    /// balances are not permitted.
    #[error("Insufficient balance: needed {needed} hours, available {available}")]
    InsufficientBalance {
        /// Hours the request needs.
        needed: Decimal,
        /// Hours available across all candidate grants.
        available: Decimal,
    },

    /// A candidate grant is expired and no manual override was supplied.
    #[error("Grant {0} is expired")]
    GrantExpired(GrantId),

    /// The request's ledger rows are not in the state the operation needs.
    #[error("Invalid ledger state for {operation}: found {found}")]
    InvalidLedgerState {
        /// The attempted operation.
        operation: &'static str,
        /// The state the request's rows are actually in.
        found: LedgerState,
    },

    /// The allocation was called with nothing to allocate.
    #[error("Nothing requested: required hours must be positive")]
    NothingRequested,
}

impl AllocationError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::GrantExpired(_) => "GRANT_EXPIRED",
            Self::InvalidLedgerState { .. } => "INVALID_LEDGER_STATE",
            Self::NothingRequested => "NOTHING_REQUESTED",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::InsufficientBalance { .. } => 422,
            Self::GrantExpired(_) | Self::NothingRequested => 400,
            Self::InvalidLedgerState { .. } => 409,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AllocationError::InsufficientBalance {
                needed: dec!(5),
                available: dec!(3),
            }
            .error_code(),
            "INSUFFICIENT_BALANCE"
        );
        assert_eq!(
            AllocationError::GrantExpired(GrantId::new()).error_code(),
            "GRANT_EXPIRED"
        );
        assert_eq!(
            AllocationError::InvalidLedgerState {
                operation: "confirm",
                found: LedgerState::None,
            }
            .error_code(),
            "INVALID_LEDGER_STATE"
        );
        assert_eq!(
            AllocationError::NothingRequested.error_code(),
            "NOTHING_REQUESTED"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(
            AllocationError::InsufficientBalance {
                needed: dec!(5),
                available: dec!(3),
            }
            .http_status_code(),
            422
        );
        assert_eq!(
            AllocationError::InvalidLedgerState {
                operation: "reverse",
                found: LedgerState::Hold,
            }
            .http_status_code(),
            409
        );
    }

    #[test]
    fn test_error_display() {
        let err = AllocationError::InsufficientBalance {
            needed: dec!(5),
            available: dec!(3),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient balance: needed 5 hours, available 3"
        );
    }
}
