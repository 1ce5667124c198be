//! Database enum types mapped to PostgreSQL enums.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How and when a policy grants leave.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "accrual_method")]
#[serde(rename_all = "snake_case")]
pub enum AccrualMethod {
    /// Granted on the anniversary of the eligibility start date.
    #[sea_orm(string_value = "anniversary")]
    Anniversary,
    /// Granted once per fiscal year on a fixed date.
    #[sea_orm(string_value = "fiscal_fixed")]
    FiscalFixed,
    /// Granted on a configured day of each month.
    #[sea_orm(string_value = "monthly")]
    Monthly,
}

/// Smallest allocatable unit of leave.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "min_unit")]
pub enum MinUnit {
    /// One hour.
    #[sea_orm(string_value = "1h")]
    #[serde(rename = "1h")]
    OneHour,
    /// Half a working day.
    #[sea_orm(string_value = "0.5d")]
    #[serde(rename = "0.5d")]
    HalfDay,
    /// One full working day.
    #[sea_orm(string_value = "1d")]
    #[serde(rename = "1d")]
    FullDay,
}

/// When consumption is deducted from availability.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "deduction_timing")]
#[serde(rename_all = "lowercase")]
pub enum DeductionTiming {
    /// Holds already count against availability.
    #[sea_orm(string_value = "apply")]
    Apply,
    /// Only confirmed rows count against availability.
    #[sea_orm(string_value = "approve")]
    Approve,
}

/// Why a consumption row exists.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "consumption_kind")]
#[serde(rename_all = "lowercase")]
pub enum ConsumptionKind {
    /// Deduction for a leave request.
    #[sea_orm(string_value = "request")]
    Request,
    /// Carry-over forfeiture applied at grant issuance.
    #[sea_orm(string_value = "forfeit")]
    Forfeit,
}
