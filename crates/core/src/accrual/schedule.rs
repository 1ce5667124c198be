//! Accrual due-date arithmetic.
//!
//! A policy produces raw due dates (anniversaries, a day of each month, or a
//! fixed fiscal date). When the policy is business-days-only, a raw due date
//! falling on a non-working day shifts forward to the next business day; the
//! engine then asks "is a (possibly shifted) due date exactly the as-of
//! date?".

use chrono::{Datelike, Days, NaiveDate};

use crate::calendar::BusinessCalendar;
use crate::policy::{AccrualMethod, LeavePolicy};

use super::types::EmployeeProfile;

/// How far back raw due dates are scanned when matching shifted dates.
/// A shift only ever moves forward, so a raw date older than this window
/// would need more than a year of consecutive non-working days to land on
/// the as-of date.
const LOOKBACK_DAYS: u64 = 366;

/// Adds calendar months, clamping the day to the target month's last day.
///
/// `2025-01-31 + 1 month = 2025-02-28`.
#[must_use]
pub fn add_months_clamped(date: NaiveDate, months: u32) -> NaiveDate {
    let zero_based = date.month0() + months;
    let year = date.year() + i32::try_from(zero_based / 12).unwrap_or(i32::MAX);
    let month = zero_based % 12 + 1;
    clamped_ymd(year, month, date.day())
}

/// Builds a date from year/month, clamping the day to the month's length.
#[must_use]
pub fn clamped_ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_else(|| {
        // Walk back from the requested day to the month's last valid day.
        (1..=3)
            .filter_map(|back| NaiveDate::from_ymd_opt(year, month, day.saturating_sub(back)))
            .next()
            .unwrap_or_default()
    })
}

/// The anniversary of `origin` in `year`; Feb 29 anniversaries fall on
/// Feb 28 in non-leap years.
#[must_use]
pub fn anniversary_in_year(origin: NaiveDate, year: i32) -> NaiveDate {
    clamped_ymd(year, origin.month(), origin.day())
}

/// Completed service years at `as_of`: the number of anniversaries of
/// `eligible_from` that have passed, not counting the start date itself.
#[must_use]
pub fn completed_service_years(eligible_from: NaiveDate, as_of: NaiveDate) -> u32 {
    if as_of < eligible_from {
        return 0;
    }
    let mut years = 0u32;
    for year in (eligible_from.year() + 1)..=as_of.year() {
        if anniversary_in_year(eligible_from, year) <= as_of {
            years += 1;
        }
    }
    years
}

/// Returns true when a grant under `policy` is due for the employee exactly
/// on `date`.
///
/// `calendar` is consulted only for business-days-only policies.
#[must_use]
pub fn grant_due_on(
    policy: &LeavePolicy,
    profile: &EmployeeProfile,
    date: NaiveDate,
    calendar: &BusinessCalendar,
) -> bool {
    let window_start = date
        .checked_sub_days(Days::new(LOOKBACK_DAYS))
        .unwrap_or(date);

    raw_due_dates(policy, profile, window_start, date)
        .into_iter()
        .any(|raw| effective_due_date(policy, raw, calendar) == Some(date))
}

/// Shifts a raw due date forward to the next business day when the policy
/// requires accrual on business days.
fn effective_due_date(
    policy: &LeavePolicy,
    raw: NaiveDate,
    calendar: &BusinessCalendar,
) -> Option<NaiveDate> {
    if policy.business_days_only {
        calendar.next_business_day_on_or_after(raw)
    } else {
        Some(raw)
    }
}

/// Raw (unshifted) due dates within `[start, end]`.
fn raw_due_dates(
    policy: &LeavePolicy,
    profile: &EmployeeProfile,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    match policy.accrual_method {
        AccrualMethod::Anniversary => {
            for year in (start.year() - 1)..=end.year() {
                let due = anniversary_in_year(profile.eligible_from, year);
                if due >= profile.eligible_from && due >= start && due <= end {
                    dates.push(due);
                }
            }
        }
        AccrualMethod::Monthly => {
            // Validated policies always carry a grant day; default keeps the
            // function total.
            let day = policy.grant_day.unwrap_or(1);
            let mut cursor = clamped_ymd(start.year(), start.month(), day);
            while cursor <= end {
                if cursor >= start {
                    dates.push(cursor);
                }
                cursor = clamped_ymd(
                    cursor.year() + i32::from(cursor.month() == 12),
                    cursor.month() % 12 + 1,
                    day,
                );
            }
        }
        AccrualMethod::FiscalFixed => {
            let month = policy.grant_month.unwrap_or(1);
            let day = policy.grant_day.unwrap_or(1);
            for year in (start.year() - 1)..=end.year() {
                let due = clamped_ymd(year, month, day);
                if due >= start && due <= end {
                    dates.push(due);
                }
            }
        }
    }
    dates
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
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
            service_bands: vec![ServiceBand {
                min_years: 0,
                days: dec!(10),
            }],
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
    fn test_add_months_clamps_to_month_end() {
        assert_eq!(add_months_clamped(date(2025, 1, 31), 1), date(2025, 2, 28));
        assert_eq!(add_months_clamped(date(2024, 1, 31), 1), date(2024, 2, 29));
        assert_eq!(add_months_clamped(date(2025, 3, 15), 24), date(2027, 3, 15));
        assert_eq!(add_months_clamped(date(2025, 11, 30), 3), date(2026, 2, 28));
    }

    #[test]
    fn test_completed_service_years() {
        let hired = date(2020, 4, 1);
        assert_eq!(completed_service_years(hired, date(2020, 4, 1)), 0);
        assert_eq!(completed_service_years(hired, date(2021, 3, 31)), 0);
        assert_eq!(completed_service_years(hired, date(2021, 4, 1)), 1);
        assert_eq!(completed_service_years(hired, date(2026, 8, 6)), 6);
    }

    #[test]
    fn test_service_years_for_leap_day_hire() {
        let hired = date(2020, 2, 29);
        // Feb 28 2021 counts as the first anniversary in a non-leap year
        assert_eq!(completed_service_years(hired, date(2021, 2, 27)), 0);
        assert_eq!(completed_service_years(hired, date(2021, 2, 28)), 1);
        assert_eq!(completed_service_years(hired, date(2024, 2, 29)), 4);
    }

    #[test]
    fn test_anniversary_due_only_on_anniversary() {
        let policy = policy(AccrualMethod::Anniversary);
        let profile = profile(date(2020, 4, 1));
        let cal = open_calendar();

        assert!(grant_due_on(&policy, &profile, date(2026, 4, 1), &cal));
        assert!(!grant_due_on(&policy, &profile, date(2026, 4, 2), &cal));
        assert!(!grant_due_on(&policy, &profile, date(2026, 3, 31), &cal));
        // The eligibility start date itself is the year-0 anniversary
        assert!(grant_due_on(&policy, &profile, date(2020, 4, 1), &cal));
        // Nothing before eligibility
        assert!(!grant_due_on(&policy, &profile, date(2019, 4, 1), &cal));
    }

    #[test]
    fn test_monthly_due_on_configured_day_with_clamp() {
        let mut policy = policy(AccrualMethod::Monthly);
        policy.grant_day = Some(31);
        let profile = profile(date(2020, 1, 1));
        let cal = open_calendar();

        assert!(grant_due_on(&policy, &profile, date(2025, 1, 31), &cal));
        // February clamps to the 28th
        assert!(grant_due_on(&policy, &profile, date(2025, 2, 28), &cal));
        assert!(!grant_due_on(&policy, &profile, date(2025, 2, 27), &cal));
        assert!(grant_due_on(&policy, &profile, date(2025, 4, 30), &cal));
        assert!(!grant_due_on(&policy, &profile, date(2025, 4, 29), &cal));
    }

    #[test]
    fn test_fiscal_fixed_due_once_per_year() {
        let mut policy = policy(AccrualMethod::FiscalFixed);
        policy.grant_month = Some(4);
        policy.grant_day = Some(1);
        let profile = profile(date(2020, 7, 15));
        let cal = open_calendar();

        assert!(grant_due_on(&policy, &profile, date(2026, 4, 1), &cal));
        assert!(!grant_due_on(&policy, &profile, date(2026, 4, 2), &cal));
        assert!(!grant_due_on(&policy, &profile, date(2026, 7, 15), &cal));
    }

    #[test]
    fn test_business_day_shift_moves_due_date_forward() {
        let mut policy = policy(AccrualMethod::FiscalFixed);
        policy.grant_month = Some(4);
        policy.grant_day = Some(1);
        policy.business_days_only = true;
        let profile = profile(date(2020, 1, 1));
        // 2028-04-01 is a Saturday
        let cal = BusinessCalendar::new([Weekday::Sat, Weekday::Sun], []);

        assert!(!grant_due_on(&policy, &profile, date(2028, 4, 1), &cal));
        assert!(grant_due_on(&policy, &profile, date(2028, 4, 3), &cal));
        assert!(!grant_due_on(&policy, &profile, date(2028, 4, 4), &cal));
    }

    #[test]
    fn test_leap_day_anniversary_in_non_leap_year() {
        let policy = policy(AccrualMethod::Anniversary);
        let profile = profile(date(2024, 2, 29));
        let cal = open_calendar();

        assert!(grant_due_on(&policy, &profile, date(2025, 2, 28), &cal));
        assert!(!grant_due_on(&policy, &profile, date(2025, 3, 1), &cal));
        assert!(grant_due_on(&policy, &profile, date(2028, 2, 29), &cal));
    }
}
