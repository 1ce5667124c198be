//! `SeaORM` Entity for the leave_policies table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{AccrualMethod, DeductionTiming, MinUnit};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "leave_policies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub leave_type_id: Uuid,
    pub accrual_method: AccrualMethod,
    /// Service-years entitlement table as JSON:
    /// `[{"min_years": 0, "days": "10"}, ...]`.
    pub service_bands: Json,
    pub prorate_part_time: bool,
    pub carryover_max_days: Option<Decimal>,
    pub expire_months: i32,
    pub min_unit: MinUnit,
    pub hours_per_day: Decimal,
    pub allow_negative: bool,
    pub deduction_timing: DeductionTiming,
    pub business_days_only: bool,
    /// Explicit blackout dates as a JSON array of `YYYY-MM-DD` strings.
    pub blackout_dates: Json,
    pub grant_month: Option<i32>,
    pub grant_day: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::companies::Entity",
        from = "Column::CompanyId",
        to = "super::companies::Column::Id"
    )]
    Companies,
    #[sea_orm(
        belongs_to = "super::leave_types::Entity",
        from = "Column::LeaveTypeId",
        to = "super::leave_types::Column::Id"
    )]
    LeaveTypes,
    #[sea_orm(has_many = "super::leave_grants::Entity")]
    LeaveGrants,
}

impl Related<super::companies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Companies.def()
    }
}

impl Related<super::leave_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeaveTypes.def()
    }
}

impl Related<super::leave_grants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeaveGrants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
