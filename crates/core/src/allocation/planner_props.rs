//! Property tests for the allocation planner.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use recess_shared::types::GrantId;

use super::planner::plan_allocation;
use super::types::CandidateGrant;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Strategy for a single unexpired candidate grant with 0..=40 whole hours.
fn candidate_strategy() -> impl Strategy<Value = CandidateGrant> {
    (0i64..=40, 0u32..365, prop::option::of(0u32..365)).prop_map(
        |(hours, granted_offset, expires_offset)| CandidateGrant {
            id: GrantId::new(),
            granted_on: date(2024, 1, 1) + chrono::Days::new(u64::from(granted_offset)),
            // Expiries all land after the fixed allocation date below
            expires_on: expires_offset
                .map(|off| date(2026, 1, 1) + chrono::Days::new(u64::from(off))),
            available_hours: Decimal::from(hours),
        },
    )
}

fn candidates_strategy() -> impl Strategy<Value = Vec<CandidateGrant>> {
    prop::collection::vec(candidate_strategy(), 0..8)
}

fn as_of() -> NaiveDate {
    date(2025, 6, 1)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// When planning succeeds, the planned rows cover exactly the needed
    /// hours (conservation).
    #[test]
    fn prop_plan_conserves_needed_hours(
        candidates in candidates_strategy(),
        needed in 1i64..=200,
    ) {
        let needed = Decimal::from(needed);
        if let Ok(plan) = plan_allocation(candidates, needed, as_of(), false, false) {
            prop_assert_eq!(plan.total_hours(), needed);
            prop_assert_eq!(plan.shortfall, Decimal::ZERO);
        }
    }

    /// No planned row ever exceeds its grant's availability when negatives
    /// are disabled.
    #[test]
    fn prop_never_overconsumes_a_grant(
        candidates in candidates_strategy(),
        needed in 1i64..=200,
    ) {
        let by_id: std::collections::HashMap<_, _> = candidates
            .iter()
            .map(|g| (g.id, g.available_hours))
            .collect();

        if let Ok(plan) =
            plan_allocation(candidates, Decimal::from(needed), as_of(), false, false)
        {
            for row in &plan.consumptions {
                prop_assert!(row.hours > Decimal::ZERO);
                prop_assert!(row.hours <= by_id[&row.grant_id]);
            }
        }
    }

    /// With negatives allowed and at least one grant, planning always
    /// succeeds and any shortfall lands on exactly the last planned row.
    #[test]
    fn prop_allow_negative_always_covers(
        candidates in candidates_strategy(),
        needed in 1i64..=400,
    ) {
        prop_assume!(!candidates.is_empty());
        let needed = Decimal::from(needed);

        let plan = plan_allocation(candidates, needed, as_of(), true, false).unwrap();
        prop_assert_eq!(plan.total_hours(), needed);
        prop_assert!(plan.shortfall >= Decimal::ZERO);
    }

    /// Planned rows follow FIFO-by-expiry: a later row's grant never expires
    /// strictly before an earlier row's grant.
    #[test]
    fn prop_rows_follow_expiry_order(
        candidates in candidates_strategy(),
        needed in 1i64..=200,
    ) {
        let expiry_by_id: std::collections::HashMap<_, _> = candidates
            .iter()
            .map(|g| (g.id, g.expires_on))
            .collect();

        if let Ok(plan) =
            plan_allocation(candidates, Decimal::from(needed), as_of(), false, false)
        {
            let keys: Vec<_> = plan
                .consumptions
                .iter()
                .map(|row| {
                    let e = expiry_by_id[&row.grant_id];
                    (e.is_none(), e.unwrap_or(NaiveDate::MAX))
                })
                .collect();
            for pair in keys.windows(2) {
                prop_assert!(pair[0] <= pair[1], "rows out of expiry order");
            }
        }
    }
}
