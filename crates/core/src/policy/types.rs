//! Leave policy domain types.
//!
//! A policy describes, per (company, leave type), when leave is granted and
//! how consumption against the resulting grants behaves.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use recess_shared::types::{CompanyId, LeavePolicyId, LeaveTypeId};

use super::error::PolicyError;
use crate::rounding::MinUnit;

/// How and when a policy grants leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccrualMethod {
    /// Granted on the anniversary of the employee's eligibility start date.
    Anniversary,
    /// Granted once per fiscal year on a fixed calendar date.
    FiscalFixed,
    /// Granted on a configured day of every month.
    Monthly,
}

impl AccrualMethod {
    /// Stable name used in logs and configuration errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Anniversary => "anniversary",
            Self::FiscalFixed => "fiscal_fixed",
            Self::Monthly => "monthly",
        }
    }
}

/// Whether consumption is deducted when a request is applied for or when it
/// is approved.
///
/// With `Apply`, hold rows already reduce the availability other requests
/// see; with `Approve`, only confirmed rows do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeductionTiming {
    /// Deduct at request time (holds count against availability).
    Apply,
    /// Deduct at approval time (only confirmed rows count).
    Approve,
}

/// One band of the service-years entitlement table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceBand {
    /// Minimum completed service years for this band.
    pub min_years: u32,
    /// Annual entitlement in days.
    pub days: Decimal,
}

/// A leave accrual policy for one (company, leave type) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeavePolicy {
    /// Unique identifier.
    pub id: LeavePolicyId,
    /// Company this policy belongs to.
    pub company_id: CompanyId,
    /// Leave type this policy grants.
    pub leave_type_id: LeaveTypeId,
    /// How and when leave is granted.
    pub accrual_method: AccrualMethod,
    /// Service-years entitlement table, sorted by ascending `min_years`.
    pub service_bands: Vec<ServiceBand>,
    /// Whether part-time employees receive a prorated quantity.
    pub prorate_part_time: bool,
    /// Maximum days carried past a new grant; `None` = unlimited.
    pub carryover_max_days: Option<Decimal>,
    /// Months until a grant expires.
    pub expire_months: u32,
    /// Smallest allocatable unit.
    pub min_unit: MinUnit,
    /// Length of a working day in hours.
    pub hours_per_day: Decimal,
    /// Whether the balance may go negative.
    pub allow_negative: bool,
    /// When consumption is deducted from availability.
    pub deduction_timing: DeductionTiming,
    /// Whether accrual dates must land on business days.
    pub business_days_only: bool,
    /// Dates on which this leave type cannot be taken.
    pub blackout_dates: Vec<NaiveDate>,
    /// Grant month for `fiscal_fixed`.
    pub grant_month: Option<u32>,
    /// Grant day of month for `monthly` and `fiscal_fixed`.
    pub grant_day: Option<u32>,
    /// Whether the policy participates in accrual runs.
    pub is_active: bool,
}

impl LeavePolicy {
    /// Annual entitlement in days for an employee with the given completed
    /// service years: the highest band whose `min_years` is reached.
    ///
    /// Returns `None` when no band applies yet.
    #[must_use]
    pub fn entitled_days(&self, service_years: u32) -> Option<Decimal> {
        self.service_bands
            .iter()
            .take_while(|band| band.min_years <= service_years)
            .last()
            .map(|band| band.days)
    }

    /// Validates the policy invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.service_bands.is_empty() {
            return Err(PolicyError::EmptyServiceTable);
        }
        for band in &self.service_bands {
            if band.days < Decimal::ZERO {
                return Err(PolicyError::NegativeBandDays {
                    min_years: band.min_years,
                });
            }
        }
        if !self
            .service_bands
            .windows(2)
            .all(|pair| pair[0].min_years < pair[1].min_years)
        {
            return Err(PolicyError::UnsortedServiceTable);
        }
        if self.expire_months == 0 {
            return Err(PolicyError::InvalidExpireMonths(self.expire_months));
        }
        if self.hours_per_day <= Decimal::ZERO || self.hours_per_day > Decimal::from(24) {
            return Err(PolicyError::InvalidHoursPerDay(self.hours_per_day));
        }
        if matches!(self.carryover_max_days, Some(cap) if cap < Decimal::ZERO) {
            return Err(PolicyError::NegativeCarryover);
        }

        match self.accrual_method {
            AccrualMethod::Anniversary => {}
            AccrualMethod::Monthly => {
                let day = self.grant_day.ok_or(PolicyError::MissingGrantDay {
                    method: AccrualMethod::Monthly.as_str(),
                })?;
                if !(1..=31).contains(&day) {
                    return Err(PolicyError::InvalidGrantDate {
                        month: None,
                        day: Some(day),
                    });
                }
            }
            AccrualMethod::FiscalFixed => {
                let month = self.grant_month.ok_or(PolicyError::MissingGrantMonth)?;
                let day = self.grant_day.ok_or(PolicyError::MissingGrantDay {
                    method: AccrualMethod::FiscalFixed.as_str(),
                })?;
                if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
                    return Err(PolicyError::InvalidGrantDate {
                        month: Some(month),
                        day: Some(day),
                    });
                }
            }
        }

        Ok(())
    }
}
