//! `SeaORM` Entity for the leave_consumptions table.
//!
//! A consumption row is owned by exactly one grant. Request rows carry the
//! requesting record's ID and flip `is_hold` at confirmation; forfeiture
//! rows have no request and are confirmed from birth.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::ConsumptionKind;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "leave_consumptions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub grant_id: Uuid,
    /// The leave request that owns this row; `None` for forfeitures.
    pub request_id: Option<Uuid>,
    pub kind: ConsumptionKind,
    /// Consumed quantity in hours; always positive.
    pub quantity_hours: Decimal,
    pub is_hold: bool,
    pub consumed_on: Date,
    pub note: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::leave_grants::Entity",
        from = "Column::GrantId",
        to = "super::leave_grants::Column::Id"
    )]
    LeaveGrants,
}

impl Related<super::leave_grants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeaveGrants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
