use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub sequence_order: i32,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sub_stage::Entity")]
    SubStage,
    #[sea_orm(has_many = "super::stage_allocation::Entity")]
    StageAllocation,
}

impl Related<super::sub_stage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubStage.def()
    }
}

impl Related<super::stage_allocation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StageAllocation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
