//! Policy repository: loads leave policies, company calendars, and employee
//! profiles for the accrual engine and the allocator.

use chrono::{NaiveDate, Utc, Weekday};
use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use serde::Deserialize;
use uuid::Uuid;

use recess_core::calendar::BusinessCalendar;
use recess_core::policy::{AccrualMethod, DeductionTiming, LeavePolicy, PolicyError, ServiceBand};
use recess_core::rounding::MinUnit;
use recess_core::accrual::EmployeeProfile;
use recess_shared::types::{CompanyId, LeavePolicyId, LeaveTypeId, UserId};

use crate::entities::{companies, company_holidays, employees, leave_policies};
use crate::entities::sea_orm_active_enums as db_enums;

/// Errors from loading policy configuration.
#[derive(Debug, thiserror::Error)]
pub enum PolicyRepoError {
    /// No active policy exists for the leave type.
    #[error("No active policy for leave type {0}")]
    NotFound(Uuid),

    /// Company not found.
    #[error("Company not found: {0}")]
    CompanyNotFound(Uuid),

    /// Stored policy configuration cannot be decoded.
    #[error("Corrupt policy configuration for {policy_id}: {reason}")]
    Corrupt {
        /// The policy row concerned.
        policy_id: Uuid,
        /// What failed to decode.
        reason: String,
    },

    /// Stored policy violates a domain invariant.
    #[error("Invalid policy {policy_id}: {source}")]
    Invalid {
        /// The policy row concerned.
        policy_id: Uuid,
        /// The violated invariant.
        source: PolicyError,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Shape of one service band in the policy's JSON column.
#[derive(Debug, Deserialize)]
struct ServiceBandRow {
    min_years: u32,
    days: rust_decimal::Decimal,
}

/// Converts a policy row into the validated core type.
///
/// # Errors
///
/// Returns `Corrupt` for undecodable JSON and `Invalid` for domain
/// violations.
pub(crate) fn to_core_policy(model: &leave_policies::Model) -> Result<LeavePolicy, PolicyRepoError> {
    let corrupt = |reason: String| PolicyRepoError::Corrupt {
        policy_id: model.id,
        reason,
    };

    let bands: Vec<ServiceBandRow> = serde_json::from_value(model.service_bands.clone())
        .map_err(|e| corrupt(format!("service_bands: {e}")))?;
    let blackout_dates: Vec<NaiveDate> = serde_json::from_value(model.blackout_dates.clone())
        .map_err(|e| corrupt(format!("blackout_dates: {e}")))?;
    let expire_months = u32::try_from(model.expire_months)
        .map_err(|_| corrupt(format!("expire_months: {}", model.expire_months)))?;

    let policy = LeavePolicy {
        id: LeavePolicyId::from_uuid(model.id),
        company_id: CompanyId::from_uuid(model.company_id),
        leave_type_id: LeaveTypeId::from_uuid(model.leave_type_id),
        accrual_method: match model.accrual_method {
            db_enums::AccrualMethod::Anniversary => AccrualMethod::Anniversary,
            db_enums::AccrualMethod::FiscalFixed => AccrualMethod::FiscalFixed,
            db_enums::AccrualMethod::Monthly => AccrualMethod::Monthly,
        },
        service_bands: bands
            .into_iter()
            .map(|b| ServiceBand {
                min_years: b.min_years,
                days: b.days,
            })
            .collect(),
        prorate_part_time: model.prorate_part_time,
        carryover_max_days: model.carryover_max_days,
        expire_months,
        min_unit: match model.min_unit {
            db_enums::MinUnit::OneHour => MinUnit::OneHour,
            db_enums::MinUnit::HalfDay => MinUnit::HalfDay,
            db_enums::MinUnit::FullDay => MinUnit::FullDay,
        },
        hours_per_day: model.hours_per_day,
        allow_negative: model.allow_negative,
        deduction_timing: match model.deduction_timing {
            db_enums::DeductionTiming::Apply => DeductionTiming::Apply,
            db_enums::DeductionTiming::Approve => DeductionTiming::Approve,
        },
        business_days_only: model.business_days_only,
        blackout_dates,
        grant_month: model.grant_month.and_then(|m| u32::try_from(m).ok()),
        grant_day: model.grant_day.and_then(|d| u32::try_from(d).ok()),
        is_active: model.is_active,
    };

    policy.validate().map_err(|source| PolicyRepoError::Invalid {
        policy_id: model.id,
        source,
    })?;

    Ok(policy)
}

/// Loads the active policy for a (company, leave type) pair on any
/// connection or transaction.
///
/// # Errors
///
/// `NotFound` when no active policy exists.
pub(crate) async fn load_active_policy<C: ConnectionTrait>(
    conn: &C,
    company_id: Uuid,
    leave_type_id: Uuid,
) -> Result<LeavePolicy, PolicyRepoError> {
    let model = leave_policies::Entity::find()
        .filter(leave_policies::Column::CompanyId.eq(company_id))
        .filter(leave_policies::Column::LeaveTypeId.eq(leave_type_id))
        .filter(leave_policies::Column::IsActive.eq(true))
        .one(conn)
        .await?
        .ok_or(PolicyRepoError::NotFound(leave_type_id))?;

    to_core_policy(&model)
}

/// Decodes the company's non-working weekdays from its JSON column
/// (ISO numbers, 1 = Monday .. 7 = Sunday). Unknown values are ignored.
pub(crate) fn non_working_weekdays(company: &companies::Model) -> Vec<Weekday> {
    let numbers: Vec<u8> =
        serde_json::from_value(company.non_working_weekdays.clone()).unwrap_or_default();
    numbers
        .into_iter()
        .filter_map(|n| match n {
            1 => Some(Weekday::Mon),
            2 => Some(Weekday::Tue),
            3 => Some(Weekday::Wed),
            4 => Some(Weekday::Thu),
            5 => Some(Weekday::Fri),
            6 => Some(Weekday::Sat),
            7 => Some(Weekday::Sun),
            _ => None,
        })
        .collect()
}

/// Today's date in the company's operational timezone; falls back to UTC
/// when the stored timezone name is unknown.
#[must_use]
pub(crate) fn company_today(company: &companies::Model) -> NaiveDate {
    company
        .timezone
        .parse::<chrono_tz::Tz>()
        .map_or_else(|_| Utc::now().date_naive(), |tz| Utc::now().with_timezone(&tz).date_naive())
}

/// Repository for policy, calendar, and employee configuration.
#[derive(Debug, Clone)]
pub struct PolicyRepository {
    db: DatabaseConnection,
}

impl PolicyRepository {
    /// Creates a new policy repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Loads the active policy for a (company, leave type) pair.
    ///
    /// # Errors
    ///
    /// `NotFound` when no active policy exists, `Corrupt`/`Invalid` when
    /// the stored configuration cannot be used.
    pub async fn find_active(
        &self,
        company_id: Uuid,
        leave_type_id: Uuid,
    ) -> Result<LeavePolicy, PolicyRepoError> {
        load_active_policy(&self.db, company_id, leave_type_id).await
    }

    /// Lists all active policies, optionally scoped to one company.
    ///
    /// Rows that fail to decode are returned as errors alongside the good
    /// ones so a bad policy never hides the rest.
    pub async fn list_active(
        &self,
        company_id: Option<Uuid>,
    ) -> Result<Vec<Result<LeavePolicy, PolicyRepoError>>, DbErr> {
        let mut query =
            leave_policies::Entity::find().filter(leave_policies::Column::IsActive.eq(true));
        if let Some(company_id) = company_id {
            query = query.filter(leave_policies::Column::CompanyId.eq(company_id));
        }
        let models = query.all(&self.db).await?;
        Ok(models.iter().map(to_core_policy).collect())
    }

    /// Loads one company row.
    ///
    /// # Errors
    ///
    /// `CompanyNotFound` when the row does not exist.
    pub async fn company(&self, company_id: Uuid) -> Result<companies::Model, PolicyRepoError> {
        companies::Entity::find_by_id(company_id)
            .one(&self.db)
            .await?
            .ok_or(PolicyRepoError::CompanyNotFound(company_id))
    }

    /// Lists companies, optionally scoped to one.
    ///
    /// # Errors
    ///
    /// `CompanyNotFound` when a requested company does not exist.
    pub async fn companies(
        &self,
        company_id: Option<Uuid>,
    ) -> Result<Vec<companies::Model>, PolicyRepoError> {
        match company_id {
            Some(id) => Ok(vec![self.company(id).await?]),
            None => Ok(companies::Entity::find().all(&self.db).await?),
        }
    }

    /// Builds the business calendar for a company: weekly pattern plus
    /// holiday rows plus the policy's explicit blackout dates.
    ///
    /// # Errors
    ///
    /// Returns an error if the holiday query fails.
    pub async fn business_calendar(
        &self,
        company: &companies::Model,
        policy: &LeavePolicy,
    ) -> Result<BusinessCalendar, DbErr> {
        let holidays = company_holidays::Entity::find()
            .filter(company_holidays::Column::CompanyId.eq(company.id))
            .all(&self.db)
            .await?;

        Ok(BusinessCalendar::new(
            non_working_weekdays(company),
            holidays.into_iter().map(|h| h.holiday_date),
        )
        .with_blackouts(policy.blackout_dates.iter().copied()))
    }

    /// Active employee profiles for a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn active_employees(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<EmployeeProfile>, DbErr> {
        let rows = employees::Entity::find()
            .filter(employees::Column::CompanyId.eq(company_id))
            .filter(employees::Column::IsActive.eq(true))
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|e| EmployeeProfile {
                user_id: UserId::from_uuid(e.id),
                eligible_from: e.eligible_from,
                fte_ratio: e.fte_ratio,
            })
            .collect())
    }
}
