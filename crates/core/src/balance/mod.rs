//! Derived balance views over the grant and consumption ledgers.
//!
//! Balances are never stored. Both views are recomputed from the ledgers on
//! every read: `remaining_confirmed` counts only confirmed consumption,
//! `remaining_including_holds` counts every row. Holds only ever push the
//! including-holds view further down, so
//! `remaining_including_holds <= remaining_confirmed` always holds.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use recess_shared::types::GrantId;

/// One grant line with its consumption totals, as loaded from the ledgers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantSummary {
    /// The grant's identity.
    pub id: GrantId,
    /// The grant date.
    pub granted_on: NaiveDate,
    /// The expiry date; `None` never expires.
    pub expires_on: Option<NaiveDate>,
    /// Granted hours.
    pub quantity: Decimal,
    /// Hours consumed by confirmed rows.
    pub confirmed_consumed: Decimal,
    /// Hours consumed by hold rows.
    pub held_consumed: Decimal,
}

impl GrantSummary {
    /// Hours remaining counting only confirmed consumption.
    #[must_use]
    pub fn remaining_confirmed(&self) -> Decimal {
        self.quantity - self.confirmed_consumed
    }

    /// Hours remaining counting holds as well.
    #[must_use]
    pub fn remaining_including_holds(&self) -> Decimal {
        self.quantity - self.confirmed_consumed - self.held_consumed
    }

    /// True when the grant can no longer be allocated against on `as_of`.
    #[must_use]
    pub fn is_expired(&self, as_of: NaiveDate) -> bool {
        matches!(self.expires_on, Some(expiry) if expiry < as_of)
    }
}

/// The two balance views for one (user, leave type) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveBalance {
    /// Hours remaining counting only confirmed consumption.
    pub remaining_confirmed: Decimal,
    /// Hours remaining counting holds as well.
    pub remaining_including_holds: Decimal,
}

/// Aggregates grant summaries into the two balance views.
///
/// Grants expired as of `as_of` are excluded: their leftover hours are no
/// longer allocatable and must not inflate the forward-looking balance.
#[must_use]
pub fn balance_from_summaries(grants: &[GrantSummary], as_of: NaiveDate) -> LeaveBalance {
    let usable = grants.iter().filter(|g| !g.is_expired(as_of));

    let mut remaining_confirmed = Decimal::ZERO;
    let mut remaining_including_holds = Decimal::ZERO;
    for grant in usable {
        remaining_confirmed += grant.remaining_confirmed();
        remaining_including_holds += grant.remaining_including_holds();
    }

    LeaveBalance {
        remaining_confirmed,
        remaining_including_holds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn summary(
        quantity: Decimal,
        confirmed: Decimal,
        held: Decimal,
        expires_on: Option<NaiveDate>,
    ) -> GrantSummary {
        GrantSummary {
            id: GrantId::new(),
            granted_on: date(2024, 4, 1),
            expires_on,
            quantity,
            confirmed_consumed: confirmed,
            held_consumed: held,
        }
    }

    #[test]
    fn test_balance_aggregates_both_views() {
        let grants = vec![
            summary(dec!(40), dec!(8), dec!(4), None),
            summary(dec!(16), dec!(0), dec!(8), None),
        ];
        let balance = balance_from_summaries(&grants, date(2025, 1, 1));

        assert_eq!(balance.remaining_confirmed, dec!(48));
        assert_eq!(balance.remaining_including_holds, dec!(36));
    }

    #[test]
    fn test_holds_never_raise_the_optimistic_view() {
        let grants = vec![
            summary(dec!(40), dec!(10), dec!(6), None),
            summary(dec!(24), dec!(24), dec!(0), Some(date(2026, 1, 1))),
        ];
        let balance = balance_from_summaries(&grants, date(2025, 1, 1));

        assert!(balance.remaining_including_holds <= balance.remaining_confirmed);
    }

    #[test]
    fn test_expired_grants_excluded_from_forward_balance() {
        let grants = vec![
            summary(dec!(40), dec!(0), dec!(0), Some(date(2024, 12, 31))),
            summary(dec!(16), dec!(0), dec!(0), Some(date(2025, 12, 31))),
        ];
        let balance = balance_from_summaries(&grants, date(2025, 6, 1));

        assert_eq!(balance.remaining_confirmed, dec!(16));
        assert_eq!(balance.remaining_including_holds, dec!(16));
    }

    #[test]
    fn test_grant_usable_on_its_expiry_date() {
        let grants = vec![summary(dec!(8), dec!(0), dec!(0), Some(date(2025, 6, 1)))];
        let balance = balance_from_summaries(&grants, date(2025, 6, 1));
        assert_eq!(balance.remaining_confirmed, dec!(8));
    }

    #[test]
    fn test_empty_ledger_is_zero() {
        let balance = balance_from_summaries(&[], date(2025, 1, 1));
        assert_eq!(balance.remaining_confirmed, dec!(0));
        assert_eq!(balance.remaining_including_holds, dec!(0));
    }

    #[test]
    fn test_negative_balance_visible_when_overdrawn() {
        let grants = vec![summary(dec!(8), dec!(10), dec!(0), None)];
        let balance = balance_from_summaries(&grants, date(2025, 1, 1));
        assert_eq!(balance.remaining_confirmed, dec!(-2));
    }
}
