//! Business-day calendar.
//!
//! A date is a business day for a company iff its weekday is not one of the
//! company's non-working weekdays and it is not an explicit blackout date
//! (public holiday, company closure, policy blackout). Pure and
//! deterministic; the canonical date key is `YYYY-MM-DD` in the company's
//! viewing timezone, resolved by the caller.

use std::collections::{BTreeSet, HashSet};

use chrono::{Datelike, Days, NaiveDate, Weekday};

/// Weekly pattern plus explicit blackout dates for one company.
#[derive(Debug, Clone, Default)]
pub struct BusinessCalendar {
    non_working_weekdays: HashSet<Weekday>,
    blackout_dates: BTreeSet<NaiveDate>,
}

impl BusinessCalendar {
    /// Creates a calendar from non-working weekdays and blackout dates.
    pub fn new(
        non_working_weekdays: impl IntoIterator<Item = Weekday>,
        blackout_dates: impl IntoIterator<Item = NaiveDate>,
    ) -> Self {
        Self {
            non_working_weekdays: non_working_weekdays.into_iter().collect(),
            blackout_dates: blackout_dates.into_iter().collect(),
        }
    }

    /// Adds further blackout dates (e.g., a policy's explicit list).
    pub fn with_blackouts(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.blackout_dates.extend(dates);
        self
    }

    /// Returns true if the date is a working day.
    #[must_use]
    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        !self.non_working_weekdays.contains(&date.weekday())
            && !self.blackout_dates.contains(&date)
    }

    /// Ordered, inclusive list of business days between `start` and `end`.
    ///
    /// Empty when `start > end` or when every date in the range is
    /// non-working.
    #[must_use]
    pub fn expand_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        let mut current = start;
        while current <= end {
            if self.is_business_day(current) {
                days.push(current);
            }
            let Some(next) = current.checked_add_days(Days::new(1)) else {
                break;
            };
            current = next;
        }
        days
    }

    /// First business day on or after `date`, searching at most one year out.
    ///
    /// Returns `None` when the calendar blocks every day in that window
    /// (a misconfigured calendar, not a normal condition).
    #[must_use]
    pub fn next_business_day_on_or_after(&self, date: NaiveDate) -> Option<NaiveDate> {
        let mut current = date;
        for _ in 0..=366 {
            if self.is_business_day(current) {
                return Some(current);
            }
            current = current.checked_add_days(Days::new(1))?;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn weekend_calendar() -> BusinessCalendar {
        BusinessCalendar::new([Weekday::Sat, Weekday::Sun], [])
    }

    #[test]
    fn test_weekday_rule() {
        let cal = weekend_calendar();
        // 2025-03-10 is a Monday
        assert!(cal.is_business_day(date(2025, 3, 10)));
        // 2025-03-15 is a Saturday
        assert!(!cal.is_business_day(date(2025, 3, 15)));
        assert!(!cal.is_business_day(date(2025, 3, 16)));
    }

    #[test]
    fn test_blackout_rule() {
        let cal = BusinessCalendar::new([Weekday::Sat, Weekday::Sun], [date(2025, 3, 12)]);
        assert!(!cal.is_business_day(date(2025, 3, 12)));
        assert!(cal.is_business_day(date(2025, 3, 13)));
    }

    #[test]
    fn test_with_blackouts_merges() {
        let cal = weekend_calendar().with_blackouts([date(2025, 3, 11)]);
        assert!(!cal.is_business_day(date(2025, 3, 11)));
    }

    #[test]
    fn test_expand_range_inclusive_and_ordered() {
        let cal = BusinessCalendar::new([Weekday::Sat, Weekday::Sun], [date(2025, 3, 12)]);
        // Mon 10th .. Mon 17th, skipping Wed 12th (blackout) and the weekend
        let days = cal.expand_range(date(2025, 3, 10), date(2025, 3, 17));
        assert_eq!(
            days,
            vec![
                date(2025, 3, 10),
                date(2025, 3, 11),
                date(2025, 3, 13),
                date(2025, 3, 14),
                date(2025, 3, 17),
            ]
        );
    }

    #[test]
    fn test_expand_range_empty_when_inverted() {
        let cal = weekend_calendar();
        assert!(cal.expand_range(date(2025, 3, 17), date(2025, 3, 10)).is_empty());
    }

    #[test]
    fn test_expand_range_all_blocked() {
        let cal = weekend_calendar();
        // Saturday..Sunday only
        assert!(cal.expand_range(date(2025, 3, 15), date(2025, 3, 16)).is_empty());
    }

    #[test]
    fn test_next_business_day_shifts_over_weekend() {
        let cal = weekend_calendar();
        assert_eq!(
            cal.next_business_day_on_or_after(date(2025, 3, 15)),
            Some(date(2025, 3, 17))
        );
        // Already a business day: unchanged
        assert_eq!(
            cal.next_business_day_on_or_after(date(2025, 3, 13)),
            Some(date(2025, 3, 13))
        );
    }

    #[test]
    fn test_next_business_day_none_when_everything_blocked() {
        let cal = BusinessCalendar::new(
            [
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
                Weekday::Sat,
                Weekday::Sun,
            ],
            [],
        );
        assert_eq!(cal.next_business_day_on_or_after(date(2025, 3, 10)), None);
    }
}
