//! `SeaORM` Entity for the leave_grants table.
//!
//! Grant rows are append-only: once created they are never updated, only
//! consumed against. Expired rows persist for history.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "leave_grants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub user_id: Uuid,
    pub leave_type_id: Uuid,
    /// The issuing policy; `None` for manual/back-fill grants.
    pub policy_id: Option<Uuid>,
    /// Granted quantity in hours (canonical unit).
    pub quantity_hours: Decimal,
    pub granted_on: Date,
    /// `None` never expires.
    pub expires_on: Option<Date>,
    pub note: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::leave_types::Entity",
        from = "Column::LeaveTypeId",
        to = "super::leave_types::Column::Id"
    )]
    LeaveTypes,
    #[sea_orm(
        belongs_to = "super::leave_policies::Entity",
        from = "Column::PolicyId",
        to = "super::leave_policies::Column::Id"
    )]
    LeavePolicies,
    #[sea_orm(has_many = "super::leave_consumptions::Entity")]
    LeaveConsumptions,
}

impl Related<super::leave_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeaveTypes.def()
    }
}

impl Related<super::leave_policies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeavePolicies.def()
    }
}

impl Related<super::leave_consumptions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeaveConsumptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
