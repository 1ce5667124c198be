//! Request ledger-footprint state machine.
//!
//! A request's consumption rows move through
//! `NONE -> HOLD -> {CONFIRMED | NONE}` and `CONFIRMED -> NONE` (reverse).
//! No other transition is valid.

use serde::{Deserialize, Serialize};

use super::error::AllocationError;

/// The aggregate state of one request's consumption rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerState {
    /// No rows exist for the request.
    None,
    /// Every row is a hold.
    Hold,
    /// Every row is confirmed.
    Confirmed,
    /// Both hold and confirmed rows exist; never produced by the allocator
    /// and always rejected.
    Mixed,
}

impl std::fmt::Display for LedgerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Hold => "hold",
            Self::Confirmed => "confirmed",
            Self::Mixed => "mixed",
        };
        write!(f, "{s}")
    }
}

impl LedgerState {
    /// Derives the state from row counts.
    #[must_use]
    pub const fn from_counts(hold_rows: usize, confirmed_rows: usize) -> Self {
        match (hold_rows, confirmed_rows) {
            (0, 0) => Self::None,
            (_, 0) => Self::Hold,
            (0, _) => Self::Confirmed,
            _ => Self::Mixed,
        }
    }
}

/// A new allocation requires the request to have no rows yet.
///
/// # Errors
///
/// Returns `InvalidLedgerState` otherwise.
pub const fn ensure_can_allocate(state: LedgerState) -> Result<(), AllocationError> {
    match state {
        LedgerState::None => Ok(()),
        found => Err(AllocationError::InvalidLedgerState {
            operation: "allocate",
            found,
        }),
    }
}

/// Confirm flips holds to confirmed; it requires hold rows.
///
/// # Errors
///
/// Returns `InvalidLedgerState` otherwise.
pub const fn ensure_can_confirm(state: LedgerState) -> Result<(), AllocationError> {
    match state {
        LedgerState::Hold => Ok(()),
        found => Err(AllocationError::InvalidLedgerState {
            operation: "confirm",
            found,
        }),
    }
}

/// Release removes holds; it requires hold rows.
///
/// # Errors
///
/// Returns `InvalidLedgerState` otherwise.
pub const fn ensure_can_release(state: LedgerState) -> Result<(), AllocationError> {
    match state {
        LedgerState::Hold => Ok(()),
        found => Err(AllocationError::InvalidLedgerState {
            operation: "release",
            found,
        }),
    }
}

/// Reverse removes confirmed rows; it requires confirmed rows.
///
/// # Errors
///
/// Returns `InvalidLedgerState` otherwise.
pub const fn ensure_can_reverse(state: LedgerState) -> Result<(), AllocationError> {
    match state {
        LedgerState::Confirmed => Ok(()),
        found => Err(AllocationError::InvalidLedgerState {
            operation: "reverse",
            found,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_from_counts() {
        assert_eq!(LedgerState::from_counts(0, 0), LedgerState::None);
        assert_eq!(LedgerState::from_counts(2, 0), LedgerState::Hold);
        assert_eq!(LedgerState::from_counts(0, 3), LedgerState::Confirmed);
        assert_eq!(LedgerState::from_counts(1, 1), LedgerState::Mixed);
    }

    #[test]
    fn test_allocate_requires_no_rows() {
        assert!(ensure_can_allocate(LedgerState::None).is_ok());
        assert!(ensure_can_allocate(LedgerState::Hold).is_err());
        assert!(ensure_can_allocate(LedgerState::Confirmed).is_err());
    }

    #[test]
    fn test_confirm_requires_hold() {
        assert!(ensure_can_confirm(LedgerState::Hold).is_ok());
        assert!(matches!(
            ensure_can_confirm(LedgerState::None),
            Err(AllocationError::InvalidLedgerState {
                operation: "confirm",
                found: LedgerState::None,
            })
        ));
        assert!(ensure_can_confirm(LedgerState::Confirmed).is_err());
        assert!(ensure_can_confirm(LedgerState::Mixed).is_err());
    }

    #[test]
    fn test_release_requires_hold() {
        assert!(ensure_can_release(LedgerState::Hold).is_ok());
        assert!(ensure_can_release(LedgerState::Confirmed).is_err());
        assert!(ensure_can_release(LedgerState::None).is_err());
    }

    #[test]
    fn test_reverse_requires_confirmed() {
        assert!(ensure_can_reverse(LedgerState::Confirmed).is_ok());
        assert!(ensure_can_reverse(LedgerState::Hold).is_err());
        assert!(ensure_can_reverse(LedgerState::None).is_err());
        assert!(ensure_can_reverse(LedgerState::Mixed).is_err());
    }
}
