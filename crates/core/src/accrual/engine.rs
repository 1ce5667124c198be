//! Grant evaluation: is a grant due, and how large is it.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::calendar::BusinessCalendar;
use crate::policy::{AccrualMethod, LeavePolicy};
use crate::rounding::round_to_min_unit_hours;

use super::schedule::{add_months_clamped, completed_service_years, grant_due_on};
use super::types::{EmployeeProfile, GrantDirective};

/// Number of months in a year, for the monthly entitlement slice.
const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// Decides whether a grant is due for `(policy, profile)` on `as_of` and
/// computes its quantity and expiry.
///
/// Returns `None` when nothing is due: the policy is inactive, the date is
/// not a (possibly business-day-shifted) due date, no service band applies
/// yet, or the rounded quantity is zero.
#[must_use]
pub fn evaluate_grant(
    policy: &LeavePolicy,
    profile: &EmployeeProfile,
    as_of: NaiveDate,
    calendar: &BusinessCalendar,
) -> Option<GrantDirective> {
    if !policy.is_active {
        return None;
    }
    if !grant_due_on(policy, profile, as_of, calendar) {
        return None;
    }

    let service_years = completed_service_years(profile.eligible_from, as_of);
    let annual_days = policy.entitled_days(service_years)?;

    let days = match policy.accrual_method {
        AccrualMethod::Monthly => annual_days / MONTHS_PER_YEAR,
        AccrualMethod::Anniversary | AccrualMethod::FiscalFixed => annual_days,
    };

    let mut hours = days * policy.hours_per_day;
    if policy.prorate_part_time {
        hours *= profile.fte_ratio;
    }
    let quantity_hours = round_to_min_unit_hours(hours, policy.min_unit, policy.hours_per_day);
    if quantity_hours <= Decimal::ZERO {
        return None;
    }

    Some(GrantDirective {
        user_id: profile.user_id,
        company_id: policy.company_id,
        leave_type_id: policy.leave_type_id,
        policy_id: policy.id,
        quantity_hours,
        granted_on: as_of,
        expires_on: Some(add_months_clamped(as_of, policy.expire_months)),
    })
}

/// Hours above the carry-over cap that must be forfeited when a new grant is
/// issued. Zero when the policy has no cap or the prior balance fits.
#[must_use]
pub fn carryover_excess_hours(policy: &LeavePolicy, prior_remaining_hours: Decimal) -> Decimal {
    match policy.carryover_max_days {
        Some(cap_days) => {
            let cap_hours = cap_days * policy.hours_per_day;
            (prior_remaining_hours - cap_hours).max(Decimal::ZERO)
        }
        None => Decimal::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use crate::policy::{DeductionTiming, ServiceBand};
    use crate::rounding::MinUnit;
    use recess_shared::types::{CompanyId, LeavePolicyId, LeaveTypeId, UserId};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn policy(method: AccrualMethod) -> LeavePolicy {
        LeavePolicy {
            id: LeavePolicyId::new(),
            company_id: CompanyId::new(),
            leave_type_id: LeaveTypeId::new(),
            accrual_method: method,
            service_bands: vec![
                ServiceBand {
                    min_years: 0,
                    days: dec!(10),
                },
                ServiceBand {
                    min_years: 3,
                    days: dec!(14),
                },
            ],
            prorate_part_time: false,
            carryover_max_days: None,
            expire_months: 24,
            min_unit: MinUnit::OneHour,
            hours_per_day: dec!(8),
            allow_negative: false,
            deduction_timing: DeductionTiming::Apply,
            business_days_only: false,
            blackout_dates: vec![],
            grant_month: None,
            grant_day: None,
            is_active: true,
        }
    }

    fn profile(eligible_from: NaiveDate) -> EmployeeProfile {
        EmployeeProfile {
            user_id: UserId::new(),
            eligible_from,
            fte_ratio: dec!(1),
        }
    }

    fn open_calendar() -> BusinessCalendar {
        BusinessCalendar::new([], [])
    }

    #[test]
    fn test_anniversary_grant_quantity_and_expiry() {
        let policy = policy(AccrualMethod::Anniversary);
        let profile = profile(date(2021, 4, 1));

        let directive = evaluate_grant(&policy, &profile, date(2025, 4, 1), &open_calendar())
            .expect("grant should be due");

        // 4 completed years -> 14-day band -> 112 hours
        assert_eq!(directive.quantity_hours, dec!(112));
        assert_eq!(directive.granted_on, date(2025, 4, 1));
        assert_eq!(directive.expires_on, Some(date(2027, 4, 1)));
        assert_eq!(directive.policy_id, policy.id);
    }

    #[test]
    fn test_not_due_returns_none() {
        let policy = policy(AccrualMethod::Anniversary);
        let profile = profile(date(2021, 4, 1));
        assert!(evaluate_grant(&policy, &profile, date(2025, 4, 2), &open_calendar()).is_none());
    }

    #[test]
    fn test_inactive_policy_never_grants() {
        let mut policy = policy(AccrualMethod::Anniversary);
        policy.is_active = false;
        let profile = profile(date(2021, 4, 1));
        assert!(evaluate_grant(&policy, &profile, date(2025, 4, 1), &open_calendar()).is_none());
    }

    #[test]
    fn test_monthly_slice_rounds_to_min_unit() {
        let mut policy = policy(AccrualMethod::Monthly);
        policy.grant_day = Some(1);
        let profile = profile(date(2024, 1, 1));

        let directive = evaluate_grant(&policy, &profile, date(2025, 3, 1), &open_calendar())
            .expect("monthly grant due");

        // 10 days / 12 months * 8h = 6.66..h -> rounds to 7h at a 1h unit
        assert_eq!(directive.quantity_hours, dec!(7));
    }

    #[test]
    fn test_part_time_proration() {
        let mut policy = policy(AccrualMethod::Anniversary);
        policy.prorate_part_time = true;
        let mut profile = profile(date(2024, 6, 1));
        profile.fte_ratio = dec!(0.5);

        let directive = evaluate_grant(&policy, &profile, date(2025, 6, 1), &open_calendar())
            .expect("grant due");

        // 10 days * 8h * 0.5 = 40 hours
        assert_eq!(directive.quantity_hours, dec!(40));
    }

    #[test]
    fn test_no_band_yet_returns_none() {
        let mut policy = policy(AccrualMethod::Anniversary);
        policy.service_bands = vec![ServiceBand {
            min_years: 1,
            days: dec!(10),
        }];
        let profile = profile(date(2025, 4, 1));
        // Year-0 anniversary is due, but no band applies yet
        assert!(evaluate_grant(&policy, &profile, date(2025, 4, 1), &open_calendar()).is_none());
    }

    #[test]
    fn test_zero_quantity_returns_none() {
        let mut policy = policy(AccrualMethod::Anniversary);
        policy.service_bands = vec![ServiceBand {
            min_years: 0,
            days: dec!(0),
        }];
        let profile = profile(date(2024, 4, 1));
        assert!(evaluate_grant(&policy, &profile, date(2025, 4, 1), &open_calendar()).is_none());
    }

    #[test]
    fn test_carryover_excess() {
        let mut policy = policy(AccrualMethod::Anniversary);
        policy.carryover_max_days = Some(dec!(5));

        // Cap is 40h; 50h remaining forfeits 10h
        assert_eq!(carryover_excess_hours(&policy, dec!(50)), dec!(10));
        assert_eq!(carryover_excess_hours(&policy, dec!(40)), dec!(0));
        assert_eq!(carryover_excess_hours(&policy, dec!(12)), dec!(0));

        policy.carryover_max_days = None;
        assert_eq!(carryover_excess_hours(&policy, dec!(500)), dec!(0));
    }
}
