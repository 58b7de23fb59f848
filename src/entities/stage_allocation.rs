use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row per (item, stage, sub-stage) holding the quantity currently
/// sitting at that position. Rows never persist with quantity <= 0; a move
/// that drains a row deletes it, and a move into an occupied position
/// increments the existing row instead of inserting a duplicate.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stage_allocations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub item_id: Uuid,
    pub organization_id: Uuid,
    pub stage_id: Uuid,
    pub sub_stage_id: Option<Uuid>,
    pub quantity: i32,
    pub moved_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order_item::Entity",
        from = "Column::ItemId",
        to = "super::order_item::Column::Id"
    )]
    OrderItem,
    #[sea_orm(
        belongs_to = "super::stage::Entity",
        from = "Column::StageId",
        to = "super::stage::Column::Id"
    )]
    Stage,
    #[sea_orm(
        belongs_to = "super::sub_stage::Entity",
        from = "Column::SubStageId",
        to = "super::sub_stage::Column::Id"
    )]
    SubStage,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItem.def()
    }
}

impl Related<super::stage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Stage.def()
    }
}

impl Related<super::sub_stage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubStage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
