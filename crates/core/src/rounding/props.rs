//! Property tests for minimum-unit rounding.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{MinUnit, round_to_min_unit_hours};

/// Strategy for hour values between 0 and 200 with two decimal places.
fn hours_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..20_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn min_unit_strategy() -> impl Strategy<Value = MinUnit> {
    prop_oneof![
        Just(MinUnit::OneHour),
        Just(MinUnit::HalfDay),
        Just(MinUnit::FullDay),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The rounded value is always an exact multiple of the rounding step.
    #[test]
    fn prop_result_is_multiple_of_step(
        hours in hours_strategy(),
        min_unit in min_unit_strategy(),
    ) {
        let hours_per_day = dec!(8);
        let step = min_unit.step_hours(hours_per_day);
        let rounded = round_to_min_unit_hours(hours, min_unit, hours_per_day);

        prop_assert_eq!(
            rounded % step,
            Decimal::ZERO,
            "rounded value {} is not a multiple of step {}", rounded, step
        );
    }

    /// The rounded value never moves more than half a step from the input.
    #[test]
    fn prop_result_within_half_step(
        hours in hours_strategy(),
        min_unit in min_unit_strategy(),
    ) {
        let hours_per_day = dec!(8);
        let step = min_unit.step_hours(hours_per_day);
        let rounded = round_to_min_unit_hours(hours, min_unit, hours_per_day);

        let distance = (rounded - hours).abs();
        prop_assert!(
            distance <= step / dec!(2),
            "rounded {} is {} away from input {}, more than half of step {}",
            rounded, distance, hours, step
        );
    }

    /// Rounding an already-rounded value is a no-op (idempotence).
    #[test]
    fn prop_rounding_is_idempotent(
        hours in hours_strategy(),
        min_unit in min_unit_strategy(),
    ) {
        let hours_per_day = dec!(8);
        let once = round_to_min_unit_hours(hours, min_unit, hours_per_day);
        let twice = round_to_min_unit_hours(once, min_unit, hours_per_day);

        prop_assert_eq!(once, twice);
    }
}
