//! The FIFO-by-expiry allocation planner.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::error::AllocationError;
use super::types::{AllocationPlan, CandidateGrant, PlannedConsumption};

/// Sorts grants into consumption order: soonest expiry first with
/// never-expiring grants last, then oldest grant date, then ID for
/// determinism.
pub fn fifo_order(grants: &mut [CandidateGrant]) {
    grants.sort_by_key(|g| {
        (
            g.expires_on.is_none(),
            g.expires_on.unwrap_or(NaiveDate::MAX),
            g.granted_on,
            g.id.into_inner(),
        )
    });
}

/// Plans consumption rows covering `needed_hours` from `candidates`.
///
/// Without `manual_override` the candidates are re-ordered FIFO-by-expiry
/// and must all be unexpired as of `as_of`; with it the caller's order is
/// preserved and expired grants are permitted (administrative correction).
///
/// On shortfall: with `allow_negative` the missing hours are charged to the
/// last candidate grant and reported in the plan's `shortfall`; otherwise
/// the whole call fails with `InsufficientBalance` and nothing may be
/// persisted.
///
/// # Errors
///
/// `NothingRequested`, `GrantExpired`, or `InsufficientBalance`.
pub fn plan_allocation(
    mut candidates: Vec<CandidateGrant>,
    needed_hours: Decimal,
    as_of: NaiveDate,
    allow_negative: bool,
    manual_override: bool,
) -> Result<AllocationPlan, AllocationError> {
    if needed_hours <= Decimal::ZERO {
        return Err(AllocationError::NothingRequested);
    }

    if manual_override {
        // Caller-specified order is authoritative for corrections.
    } else {
        if let Some(expired) = candidates.iter().find(|g| g.is_expired(as_of)) {
            return Err(AllocationError::GrantExpired(expired.id));
        }
        fifo_order(&mut candidates);
    }

    let total_available: Decimal = candidates
        .iter()
        .map(|g| g.available_hours.max(Decimal::ZERO))
        .sum();

    if total_available < needed_hours && !allow_negative {
        return Err(AllocationError::InsufficientBalance {
            needed: needed_hours,
            available: total_available,
        });
    }
    if candidates.is_empty() {
        // Even a negative balance needs a grant row to hang consumption on.
        return Err(AllocationError::InsufficientBalance {
            needed: needed_hours,
            available: Decimal::ZERO,
        });
    }

    let mut consumptions: Vec<PlannedConsumption> = Vec::new();
    let mut remaining = needed_hours;

    for grant in &candidates {
        if remaining <= Decimal::ZERO {
            break;
        }
        let take = remaining.min(grant.available_hours.max(Decimal::ZERO));
        if take > Decimal::ZERO {
            consumptions.push(PlannedConsumption {
                grant_id: grant.id,
                hours: take,
            });
            remaining -= take;
        }
    }

    let shortfall = remaining;
    if shortfall > Decimal::ZERO {
        // allow_negative: the last candidate absorbs the overdraft.
        let last_id = candidates[candidates.len() - 1].id;
        match consumptions.last_mut() {
            Some(last) if last.grant_id == last_id => last.hours += shortfall,
            _ => consumptions.push(PlannedConsumption {
                grant_id: last_id,
                hours: shortfall,
            }),
        }
    }

    Ok(AllocationPlan {
        consumptions,
        shortfall,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use recess_shared::types::GrantId;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn grant(
        granted_on: NaiveDate,
        expires_on: Option<NaiveDate>,
        available: Decimal,
    ) -> CandidateGrant {
        CandidateGrant {
            id: GrantId::new(),
            granted_on,
            expires_on,
            available_hours: available,
        }
    }

    #[test]
    fn test_fifo_consumes_soonest_expiring_first() {
        // Grants: 5h exp 2025-01-31, 5h exp 2025-06-30, 5h never expires.
        // Allocating 7h takes 5 from the first, 2 from the second, 0 from
        // the third.
        let g1 = grant(date(2024, 1, 1), Some(date(2025, 1, 31)), dec!(5));
        let g2 = grant(date(2024, 6, 1), Some(date(2025, 6, 30)), dec!(5));
        let g3 = grant(date(2024, 3, 1), None, dec!(5));
        let (id1, id2) = (g1.id, g2.id);

        let plan = plan_allocation(
            vec![g3, g2, g1],
            dec!(7),
            date(2025, 1, 10),
            false,
            false,
        )
        .unwrap();

        assert_eq!(plan.consumptions.len(), 2);
        assert_eq!(plan.consumptions[0], PlannedConsumption { grant_id: id1, hours: dec!(5) });
        assert_eq!(plan.consumptions[1], PlannedConsumption { grant_id: id2, hours: dec!(2) });
        assert_eq!(plan.shortfall, dec!(0));
        assert_eq!(plan.total_hours(), dec!(7));
    }

    #[test]
    fn test_tie_break_by_grant_date() {
        let expiry = Some(date(2025, 12, 31));
        let older = grant(date(2024, 1, 1), expiry, dec!(3));
        let newer = grant(date(2024, 7, 1), expiry, dec!(3));
        let older_id = older.id;

        let plan =
            plan_allocation(vec![newer, older], dec!(2), date(2025, 1, 1), false, false).unwrap();

        assert_eq!(plan.consumptions.len(), 1);
        assert_eq!(plan.consumptions[0].grant_id, older_id);
    }

    #[test]
    fn test_insufficient_balance_plans_nothing() {
        let g = grant(date(2024, 1, 1), None, dec!(3));
        let result = plan_allocation(vec![g], dec!(5), date(2025, 1, 1), false, false);

        assert_eq!(
            result,
            Err(AllocationError::InsufficientBalance {
                needed: dec!(5),
                available: dec!(3),
            })
        );
    }

    #[test]
    fn test_allow_negative_charges_last_grant() {
        let g1 = grant(date(2024, 1, 1), Some(date(2025, 3, 31)), dec!(3));
        let g2 = grant(date(2024, 6, 1), Some(date(2025, 9, 30)), dec!(1));
        let last_id = g2.id;

        let plan =
            plan_allocation(vec![g1, g2], dec!(6), date(2025, 1, 1), true, false).unwrap();

        assert_eq!(plan.shortfall, dec!(2));
        assert_eq!(plan.total_hours(), dec!(6));
        // Last grant's row carries its 1h availability plus the 2h overdraft
        assert_eq!(plan.consumptions.last().unwrap().grant_id, last_id);
        assert_eq!(plan.consumptions.last().unwrap().hours, dec!(3));
    }

    #[test]
    fn test_allow_negative_without_grants_still_fails() {
        let result = plan_allocation(vec![], dec!(4), date(2025, 1, 1), true, false);
        assert_eq!(
            result,
            Err(AllocationError::InsufficientBalance {
                needed: dec!(4),
                available: dec!(0),
            })
        );
    }

    #[test]
    fn test_expired_candidate_rejected_without_override() {
        let g = grant(date(2023, 1, 1), Some(date(2024, 1, 1)), dec!(8));
        let id = g.id;
        let result = plan_allocation(vec![g], dec!(4), date(2025, 1, 1), false, false);
        assert_eq!(result, Err(AllocationError::GrantExpired(id)));
    }

    #[test]
    fn test_manual_override_allows_expired_and_keeps_order() {
        let expired = grant(date(2023, 1, 1), Some(date(2024, 1, 1)), dec!(8));
        let fresh = grant(date(2024, 6, 1), Some(date(2026, 1, 1)), dec!(8));
        let expired_id = expired.id;

        // Caller order puts the expired grant first; FIFO would not.
        let plan =
            plan_allocation(vec![expired, fresh], dec!(10), date(2025, 1, 1), false, true)
                .unwrap();

        assert_eq!(plan.consumptions[0].grant_id, expired_id);
        assert_eq!(plan.consumptions[0].hours, dec!(8));
        assert_eq!(plan.consumptions[1].hours, dec!(2));
    }

    #[test]
    fn test_grant_usable_through_expiry_date() {
        let g = grant(date(2024, 1, 1), Some(date(2025, 1, 31)), dec!(5));
        let plan = plan_allocation(vec![g], dec!(5), date(2025, 1, 31), false, false).unwrap();
        assert_eq!(plan.total_hours(), dec!(5));
    }

    #[test]
    fn test_nothing_requested() {
        let g = grant(date(2024, 1, 1), None, dec!(5));
        assert_eq!(
            plan_allocation(vec![g], dec!(0), date(2025, 1, 1), false, false),
            Err(AllocationError::NothingRequested)
        );
    }

    #[test]
    fn test_negative_availability_treated_as_empty() {
        // A previously overdrafted grant contributes nothing further.
        let overdrawn = grant(date(2024, 1, 1), Some(date(2025, 6, 30)), dec!(-2));
        let fresh = grant(date(2024, 6, 1), Some(date(2025, 9, 30)), dec!(5));
        let fresh_id = fresh.id;

        let plan =
            plan_allocation(vec![overdrawn, fresh], dec!(4), date(2025, 1, 1), false, false)
                .unwrap();

        assert_eq!(plan.consumptions.len(), 1);
        assert_eq!(plan.consumptions[0].grant_id, fresh_id);
        assert_eq!(plan.consumptions[0].hours, dec!(4));
    }
}
