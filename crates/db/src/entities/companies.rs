//! `SeaORM` Entity for the companies table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "companies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    /// IANA timezone name used to resolve "today" for accrual runs.
    pub timezone: String,
    /// Non-working weekdays as ISO numbers (1 = Monday .. 7 = Sunday).
    pub non_working_weekdays: Json,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::employees::Entity")]
    Employees,
    #[sea_orm(has_many = "super::leave_types::Entity")]
    LeaveTypes,
    #[sea_orm(has_many = "super::company_holidays::Entity")]
    CompanyHolidays,
}

impl Related<super::employees::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employees.def()
    }
}

impl Related<super::leave_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeaveTypes.def()
    }
}

impl Related<super::company_holidays::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CompanyHolidays.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
