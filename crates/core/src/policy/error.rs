//! Policy validation errors.

use thiserror::Error;

/// Errors raised when a leave policy fails its invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    /// The service-years table has no bands.
    #[error("Policy service table must have at least one band")]
    EmptyServiceTable,

    /// A service band grants a negative number of days.
    #[error("Service band at {min_years} years grants negative days")]
    NegativeBandDays {
        /// The band's minimum service years.
        min_years: u32,
    },

    /// Service bands must be sorted by ascending minimum years.
    #[error("Service table bands must be sorted by ascending min_years")]
    UnsortedServiceTable,

    /// Grants must expire after a positive number of months.
    #[error("Policy expire_months must be positive, got {0}")]
    InvalidExpireMonths(u32),

    /// The working-day length is out of range.
    #[error("Policy hours_per_day must be between 1 and 24, got {0}")]
    InvalidHoursPerDay(rust_decimal::Decimal),

    /// The carry-over cap cannot be negative.
    #[error("Policy carryover_max_days cannot be negative")]
    NegativeCarryover,

    /// The accrual method needs a grant day (monthly, fiscal_fixed).
    #[error("Accrual method {method} requires a grant day")]
    MissingGrantDay {
        /// The accrual method missing its configuration.
        method: &'static str,
    },

    /// The fiscal_fixed method needs a grant month.
    #[error("Accrual method fiscal_fixed requires a grant month")]
    MissingGrantMonth,

    /// The configured grant month/day is not a possible calendar date.
    #[error("Invalid grant date configuration: month {month:?}, day {day:?}")]
    InvalidGrantDate {
        /// Configured month, if any.
        month: Option<u32>,
        /// Configured day, if any.
        day: Option<u32>,
    },
}
