//! `SeaORM` Entity for the leave_types table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "leave_types")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
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
    #[sea_orm(has_many = "super::leave_policies::Entity")]
    LeavePolicies,
    #[sea_orm(has_many = "super::leave_grants::Entity")]
    LeaveGrants,
}

impl Related<super::companies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Companies.def()
    }
}

impl Related<super::leave_policies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeavePolicies.def()
    }
}

impl Related<super::leave_grants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeaveGrants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
