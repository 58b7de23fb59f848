//! Movement history read models. History is append-only and survives stage
//! deletion, so stage names are resolved best-effort against the live
//! topology and come back as `None` for positions that no longer exist.

use crate::{
    auth::StaffContext,
    db::DbPool,
    entities::movement_history::{self, Entity as MovementHistoryEntity},
    entities::order_item::{self, Entity as OrderItemEntity},
    errors::ServiceError,
    services::stages::load_topology,
    workflow::StageNode,
};
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// One ledger entry, annotated with display names and the derived movement
/// direction.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HistoryEntryView {
    pub id: Uuid,
    pub item_id: Uuid,
    pub from_stage_id: Option<Uuid>,
    pub from_stage_name: Option<String>,
    pub from_sub_stage_id: Option<Uuid>,
    pub from_sub_stage_name: Option<String>,
    pub to_stage_id: Uuid,
    pub to_stage_name: Option<String>,
    pub to_sub_stage_id: Option<Uuid>,
    pub to_sub_stage_name: Option<String>,
    pub quantity: i32,
    /// "allocation", "forward" or "rework".
    pub direction: String,
    pub rework_reason: Option<String>,
    pub moved_at: DateTime<Utc>,
    pub moved_by: Uuid,
}

#[derive(Clone)]
pub struct HistoryService {
    db_pool: Arc<DbPool>,
}

impl HistoryService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Pages through one item's movement trail, newest first.
    #[instrument(skip(self, ctx), fields(organization_id = %ctx.organization_id, item_id = %item_id))]
    pub async fn list_item_history(
        &self,
        ctx: &StaffContext,
        item_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<HistoryEntryView>, u64), ServiceError> {
        let db = &*self.db_pool;
        let item = OrderItemEntity::find_by_id(item_id)
            .filter(order_item::Column::OrganizationId.eq(ctx.organization_id))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?;
        if item.is_none() {
            warn!(item_id = %item_id, "Item not found");
            return Err(ServiceError::NotFound(format!(
                "Item {} not found",
                item_id
            )));
        }

        let paginator = MovementHistoryEntity::find()
            .filter(movement_history::Column::ItemId.eq(item_id))
            .order_by_desc(movement_history::Column::MovedAt)
            .paginate(db, per_page.max(1));
        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::DatabaseError)?;
        let entries = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::DatabaseError)?;

        let topology = load_topology(db, ctx.organization_id).await?;
        Ok((annotate(entries, &topology), total))
    }

    /// Pages through the organization-wide trail, newest first.
    #[instrument(skip(self, ctx), fields(organization_id = %ctx.organization_id))]
    pub async fn list_org_history(
        &self,
        ctx: &StaffContext,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<HistoryEntryView>, u64), ServiceError> {
        let db = &*self.db_pool;
        let paginator = MovementHistoryEntity::find()
            .filter(movement_history::Column::OrganizationId.eq(ctx.organization_id))
            .order_by_desc(movement_history::Column::MovedAt)
            .paginate(db, per_page.max(1));
        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::DatabaseError)?;
        let entries = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::DatabaseError)?;

        let topology = load_topology(db, ctx.organization_id).await?;
        Ok((annotate(entries, &topology), total))
    }
}

fn annotate(entries: Vec<movement_history::Model>, topology: &[StageNode]) -> Vec<HistoryEntryView> {
    entries
        .into_iter()
        .map(|entry| {
            let direction = direction_of(&entry).to_string();
            HistoryEntryView {
                from_stage_name: entry.from_stage_id.and_then(|s| stage_name(topology, s)),
                from_sub_stage_name: match (entry.from_stage_id, entry.from_sub_stage_id) {
                    (Some(stage), Some(sub)) => sub_stage_name(topology, stage, sub),
                    _ => None,
                },
                to_stage_name: stage_name(topology, entry.to_stage_id),
                to_sub_stage_name: entry
                    .to_sub_stage_id
                    .and_then(|sub| sub_stage_name(topology, entry.to_stage_id, sub)),
                id: entry.id,
                item_id: entry.item_id,
                from_stage_id: entry.from_stage_id,
                from_sub_stage_id: entry.from_sub_stage_id,
                to_stage_id: entry.to_stage_id,
                to_sub_stage_id: entry.to_sub_stage_id,
                quantity: entry.quantity,
                direction,
                rework_reason: entry.rework_reason,
                moved_at: entry.moved_at,
                moved_by: entry.moved_by,
            }
        })
        .collect()
}

/// An entry without a source is a first allocation; one with a reason went
/// backward for rework; everything else moved forward.
fn direction_of(entry: &movement_history::Model) -> &'static str {
    if entry.from_stage_id.is_none() {
        "allocation"
    } else if entry.rework_reason.is_some() {
        "rework"
    } else {
        "forward"
    }
}

fn stage_name(topology: &[StageNode], stage_id: Uuid) -> Option<String> {
    topology
        .iter()
        .find(|s| s.id == stage_id)
        .map(|s| s.name.clone())
}

fn sub_stage_name(topology: &[StageNode], stage_id: Uuid, sub_stage_id: Uuid) -> Option<String> {
    topology
        .iter()
        .find(|s| s.id == stage_id)?
        .sub_stages
        .iter()
        .find(|ss| ss.id == sub_stage_id)
        .map(|ss| ss.name.clone())
}
