use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_id: Uuid,
    pub organization_id: Uuid,
    pub sku: String,
    pub name: String,
    pub total_quantity: i32,
    /// Free-form descriptive attributes (size, finish, packing notes). Never
    /// interpreted by the movement engine.
    pub attributes: Option<Json>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::export_order::Entity",
        from = "Column::OrderId",
        to = "super::export_order::Column::Id"
    )]
    ExportOrder,
    #[sea_orm(has_many = "super::stage_allocation::Entity")]
    StageAllocation,
    #[sea_orm(has_many = "super::movement_history::Entity")]
    MovementHistory,
}

impl Related<super::export_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExportOrder.def()
    }
}

impl Related<super::stage_allocation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StageAllocation.def()
    }
}

impl Related<super::movement_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovementHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
