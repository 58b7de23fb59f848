use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only movement ledger. `from_stage_id` is null only for an item's
/// first allocation out of the unallocated pool; rework entries always carry
/// a reason.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "movement_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub item_id: Uuid,
    pub organization_id: Uuid,
    pub from_stage_id: Option<Uuid>,
    pub from_sub_stage_id: Option<Uuid>,
    pub to_stage_id: Uuid,
    pub to_sub_stage_id: Option<Uuid>,
    pub quantity: i32,
    pub moved_at: DateTime<Utc>,
    pub moved_by: Uuid,
    pub rework_reason: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order_item::Entity",
        from = "Column::ItemId",
        to = "super::order_item::Column::Id"
    )]
    OrderItem,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
