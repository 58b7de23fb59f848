use crate::{
    auth::StaffContext,
    db::DbPool,
    entities::stage::{self, ActiveModel as StageActiveModel, Entity as StageEntity},
    entities::stage_allocation::{self, Entity as StageAllocationEntity},
    entities::sub_stage::{self, ActiveModel as SubStageActiveModel, Entity as SubStageEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    workflow::{self, FlatPosition, Position, StageNode},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateStageRequest {
    #[validate(length(min = 1, max = 100, message = "Stage name must be 1-100 characters"))]
    pub name: String,
    /// Defaults to the end of the workflow when omitted.
    pub sequence_order: Option<i32>,
    #[validate(length(max = 100))]
    pub location: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateStageRequest {
    #[validate(length(min = 1, max = 100, message = "Stage name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 100))]
    pub location: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateSubStageRequest {
    #[validate(length(min = 1, max = 100, message = "Sub-stage name must be 1-100 characters"))]
    pub name: String,
    /// Defaults to the end of the parent stage when omitted.
    pub sequence_order: Option<i32>,
    #[validate(length(max = 100))]
    pub location: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateSubStageRequest {
    #[validate(length(min = 1, max = 100, message = "Sub-stage name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 100))]
    pub location: Option<String>,
}

/// Loads one organization's full topology, assembled and ordered.
pub async fn load_topology<C: ConnectionTrait>(
    conn: &C,
    organization_id: Uuid,
) -> Result<Vec<StageNode>, ServiceError> {
    let stages = StageEntity::find()
        .filter(stage::Column::OrganizationId.eq(organization_id))
        .all(conn)
        .await
        .map_err(|e| {
            error!(error = %e, organization_id = %organization_id, "Failed to load stages");
            ServiceError::DatabaseError(e)
        })?;

    let stage_ids: Vec<Uuid> = stages.iter().map(|s| s.id).collect();
    let sub_stages = if stage_ids.is_empty() {
        Vec::new()
    } else {
        SubStageEntity::find()
            .filter(sub_stage::Column::StageId.is_in(stage_ids))
            .all(conn)
            .await
            .map_err(|e| {
                error!(error = %e, organization_id = %organization_id, "Failed to load sub-stages");
                ServiceError::DatabaseError(e)
            })?
    };

    Ok(workflow::assemble(stages, sub_stages))
}

/// Service for managing the workflow topology: stages, sub-stages, ordering.
#[derive(Clone)]
pub struct StageService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl StageService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    fn require_manage(&self, ctx: &StaffContext) -> Result<(), ServiceError> {
        if !ctx.role.can_manage_stages() {
            return Err(ServiceError::Forbidden(
                "only owners can manage workflow stages".to_string(),
            ));
        }
        Ok(())
    }

    /// Lists the organization's stages with nested sub-stages, fully ordered.
    #[instrument(skip(self), fields(organization_id = %organization_id))]
    pub async fn list_topology(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<StageNode>, ServiceError> {
        load_topology(&*self.db_pool, organization_id).await
    }

    /// Creates a stage, appended to the end of the workflow unless the
    /// request pins a sequence order.
    #[instrument(skip(self, ctx, request), fields(organization_id = %ctx.organization_id, name = %request.name))]
    pub async fn create_stage(
        &self,
        ctx: &StaffContext,
        request: CreateStageRequest,
    ) -> Result<stage::Model, ServiceError> {
        self.require_manage(ctx)?;
        request.validate()?;

        let db = &*self.db_pool;
        let now = Utc::now();
        let stage_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for stage creation");
            ServiceError::DatabaseError(e)
        })?;

        let sequence_order = match request.sequence_order {
            Some(order) => order,
            None => {
                let existing = StageEntity::find()
                    .filter(stage::Column::OrganizationId.eq(ctx.organization_id))
                    .all(&txn)
                    .await
                    .map_err(ServiceError::DatabaseError)?;
                existing
                    .iter()
                    .map(|s| s.sequence_order)
                    .max()
                    .map_or(1, |max| max + 1)
            }
        };

        let model = StageActiveModel {
            id: Set(stage_id),
            organization_id: Set(ctx.organization_id),
            name: Set(request.name.clone()),
            sequence_order: Set(sequence_order),
            location: Set(request.location),
            created_at: Set(now),
            updated_at: Set(None),
        };

        let created = model.insert(&txn).await.map_err(|e| {
            error!(error = %e, stage_id = %stage_id, "Failed to create stage");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, stage_id = %stage_id, "Failed to commit stage creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(stage_id = %stage_id, sequence_order = sequence_order, "Stage created");
        self.emit(Event::StageCreated(stage_id)).await;

        Ok(created)
    }

    /// Renames or relocates a stage. Sequence order changes go through the
    /// move-up/move-down swaps instead.
    #[instrument(skip(self, ctx, request), fields(stage_id = %stage_id))]
    pub async fn update_stage(
        &self,
        ctx: &StaffContext,
        stage_id: Uuid,
        request: UpdateStageRequest,
    ) -> Result<stage::Model, ServiceError> {
        self.require_manage(ctx)?;
        request.validate()?;

        let db = &*self.db_pool;
        let stage = self.find_stage(db, ctx.organization_id, stage_id).await?;

        let mut active: StageActiveModel = stage.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(location) = request.location {
            active.location = Set(Some(location));
        }
        active.updated_at = Set(Some(Utc::now()));

        let updated = active.update(db).await.map_err(|e| {
            error!(error = %e, stage_id = %stage_id, "Failed to update stage");
            ServiceError::DatabaseError(e)
        })?;

        info!(stage_id = %stage_id, "Stage updated");
        self.emit(Event::StageUpdated(stage_id)).await;

        Ok(updated)
    }

    /// Swaps the stage's sequence order with its predecessor.
    #[instrument(skip(self, ctx), fields(stage_id = %stage_id))]
    pub async fn move_stage_up(
        &self,
        ctx: &StaffContext,
        stage_id: Uuid,
    ) -> Result<Vec<StageNode>, ServiceError> {
        self.swap_stage(ctx, stage_id, SwapDirection::Up).await
    }

    /// Swaps the stage's sequence order with its successor.
    #[instrument(skip(self, ctx), fields(stage_id = %stage_id))]
    pub async fn move_stage_down(
        &self,
        ctx: &StaffContext,
        stage_id: Uuid,
    ) -> Result<Vec<StageNode>, ServiceError> {
        self.swap_stage(ctx, stage_id, SwapDirection::Down).await
    }

    async fn swap_stage(
        &self,
        ctx: &StaffContext,
        stage_id: Uuid,
        direction: SwapDirection,
    ) -> Result<Vec<StageNode>, ServiceError> {
        self.require_manage(ctx)?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, stage_id = %stage_id, "Failed to start transaction for stage reorder");
            ServiceError::DatabaseError(e)
        })?;

        let mut stages = StageEntity::find()
            .filter(stage::Column::OrganizationId.eq(ctx.organization_id))
            .all(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;
        stages.sort_by_key(|s| (s.sequence_order, s.id));

        let index = stages
            .iter()
            .position(|s| s.id == stage_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Stage {} not found", stage_id)))?;

        let neighbor_index = match direction {
            SwapDirection::Up if index == 0 => {
                return Err(ServiceError::ValidationError(
                    "stage is already first in the workflow".to_string(),
                ));
            }
            SwapDirection::Down if index + 1 == stages.len() => {
                return Err(ServiceError::ValidationError(
                    "stage is already last in the workflow".to_string(),
                ));
            }
            SwapDirection::Up => index - 1,
            SwapDirection::Down => index + 1,
        };

        let stage_order = stages[index].sequence_order;
        let neighbor_order = stages[neighbor_index].sequence_order;
        let neighbor_id = stages[neighbor_index].id;
        let now = Utc::now();

        let mut moving: StageActiveModel = stages[index].clone().into();
        moving.sequence_order = Set(neighbor_order);
        moving.updated_at = Set(Some(now));
        moving.update(&txn).await.map_err(|e| {
            error!(error = %e, stage_id = %stage_id, "Failed to reorder stage");
            ServiceError::DatabaseError(e)
        })?;

        let mut neighbor: StageActiveModel = stages[neighbor_index].clone().into();
        neighbor.sequence_order = Set(stage_order);
        neighbor.updated_at = Set(Some(now));
        neighbor.update(&txn).await.map_err(|e| {
            error!(error = %e, stage_id = %neighbor_id, "Failed to reorder neighbor stage");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, stage_id = %stage_id, "Failed to commit stage reorder");
            ServiceError::DatabaseError(e)
        })?;

        info!(stage_id = %stage_id, swapped_with = %neighbor_id, "Stage reordered");
        self.emit(Event::StageReordered {
            stage_id,
            swapped_with: neighbor_id,
        })
        .await;

        self.list_topology(ctx.organization_id).await
    }

    /// Deletes a stage, refused while any allocation still references it.
    /// Its sub-stages go with it.
    #[instrument(skip(self, ctx), fields(stage_id = %stage_id))]
    pub async fn delete_stage(
        &self,
        ctx: &StaffContext,
        stage_id: Uuid,
    ) -> Result<(), ServiceError> {
        self.require_manage(ctx)?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, stage_id = %stage_id, "Failed to start transaction for stage deletion");
            ServiceError::DatabaseError(e)
        })?;

        self.find_stage(&txn, ctx.organization_id, stage_id).await?;

        let held = StageAllocationEntity::find()
            .filter(stage_allocation::Column::StageId.eq(stage_id))
            .count(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;
        if held > 0 {
            warn!(stage_id = %stage_id, allocations = held, "Refusing to delete a stage holding allocations");
            return Err(ServiceError::Conflict(format!(
                "stage {} still holds {} allocation(s); move them before deleting",
                stage_id, held
            )));
        }

        StageEntity::delete_by_id(stage_id)
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, stage_id = %stage_id, "Failed to delete stage");
                ServiceError::DatabaseError(e)
            })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, stage_id = %stage_id, "Failed to commit stage deletion");
            ServiceError::DatabaseError(e)
        })?;

        info!(stage_id = %stage_id, "Stage deleted");
        self.emit(Event::StageDeleted(stage_id)).await;

        Ok(())
    }

    /// Creates a sub-stage under a stage. Refused while the parent holds
    /// allocations placed directly on it, since a stage with sub-stages may
    /// only be occupied through them.
    #[instrument(skip(self, ctx, request), fields(stage_id = %stage_id, name = %request.name))]
    pub async fn create_sub_stage(
        &self,
        ctx: &StaffContext,
        stage_id: Uuid,
        request: CreateSubStageRequest,
    ) -> Result<sub_stage::Model, ServiceError> {
        self.require_manage(ctx)?;
        request.validate()?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, stage_id = %stage_id, "Failed to start transaction for sub-stage creation");
            ServiceError::DatabaseError(e)
        })?;

        self.find_stage(&txn, ctx.organization_id, stage_id).await?;

        let direct = StageAllocationEntity::find()
            .filter(stage_allocation::Column::StageId.eq(stage_id))
            .filter(stage_allocation::Column::SubStageId.is_null())
            .count(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;
        if direct > 0 {
            return Err(ServiceError::Conflict(format!(
                "stage {} holds {} allocation(s) placed directly on it; move them before adding sub-stages",
                stage_id, direct
            )));
        }

        let sequence_order = match request.sequence_order {
            Some(order) => order,
            None => {
                let siblings = SubStageEntity::find()
                    .filter(sub_stage::Column::StageId.eq(stage_id))
                    .all(&txn)
                    .await
                    .map_err(ServiceError::DatabaseError)?;
                siblings
                    .iter()
                    .map(|s| s.sequence_order)
                    .max()
                    .map_or(1, |max| max + 1)
            }
        };

        let now = Utc::now();
        let sub_stage_id = Uuid::new_v4();
        let model = SubStageActiveModel {
            id: Set(sub_stage_id),
            stage_id: Set(stage_id),
            name: Set(request.name.clone()),
            sequence_order: Set(sequence_order),
            location: Set(request.location),
            created_at: Set(now),
            updated_at: Set(None),
        };

        let created = model.insert(&txn).await.map_err(|e| {
            error!(error = %e, sub_stage_id = %sub_stage_id, "Failed to create sub-stage");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, sub_stage_id = %sub_stage_id, "Failed to commit sub-stage creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(sub_stage_id = %sub_stage_id, stage_id = %stage_id, "Sub-stage created");
        self.emit(Event::SubStageCreated {
            stage_id,
            sub_stage_id,
        })
        .await;

        Ok(created)
    }

    #[instrument(skip(self, ctx, request), fields(sub_stage_id = %sub_stage_id))]
    pub async fn update_sub_stage(
        &self,
        ctx: &StaffContext,
        sub_stage_id: Uuid,
        request: UpdateSubStageRequest,
    ) -> Result<sub_stage::Model, ServiceError> {
        self.require_manage(ctx)?;
        request.validate()?;

        let db = &*self.db_pool;
        let sub = self
            .find_sub_stage(db, ctx.organization_id, sub_stage_id)
            .await?;

        let mut active: SubStageActiveModel = sub.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(location) = request.location {
            active.location = Set(Some(location));
        }
        active.updated_at = Set(Some(Utc::now()));

        let updated = active.update(db).await.map_err(|e| {
            error!(error = %e, sub_stage_id = %sub_stage_id, "Failed to update sub-stage");
            ServiceError::DatabaseError(e)
        })?;

        info!(sub_stage_id = %sub_stage_id, "Sub-stage updated");
        self.emit(Event::SubStageUpdated(sub_stage_id)).await;

        Ok(updated)
    }

    /// Swaps the sub-stage's sequence order with its predecessor sibling.
    #[instrument(skip(self, ctx), fields(sub_stage_id = %sub_stage_id))]
    pub async fn move_sub_stage_up(
        &self,
        ctx: &StaffContext,
        sub_stage_id: Uuid,
    ) -> Result<Vec<StageNode>, ServiceError> {
        self.swap_sub_stage(ctx, sub_stage_id, SwapDirection::Up)
            .await
    }

    /// Swaps the sub-stage's sequence order with its successor sibling.
    #[instrument(skip(self, ctx), fields(sub_stage_id = %sub_stage_id))]
    pub async fn move_sub_stage_down(
        &self,
        ctx: &StaffContext,
        sub_stage_id: Uuid,
    ) -> Result<Vec<StageNode>, ServiceError> {
        self.swap_sub_stage(ctx, sub_stage_id, SwapDirection::Down)
            .await
    }

    async fn swap_sub_stage(
        &self,
        ctx: &StaffContext,
        sub_stage_id: Uuid,
        direction: SwapDirection,
    ) -> Result<Vec<StageNode>, ServiceError> {
        self.require_manage(ctx)?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, sub_stage_id = %sub_stage_id, "Failed to start transaction for sub-stage reorder");
            ServiceError::DatabaseError(e)
        })?;

        let sub = self
            .find_sub_stage(&txn, ctx.organization_id, sub_stage_id)
            .await?;

        let mut siblings = SubStageEntity::find()
            .filter(sub_stage::Column::StageId.eq(sub.stage_id))
            .all(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;
        siblings.sort_by_key(|s| (s.sequence_order, s.id));

        let index = siblings
            .iter()
            .position(|s| s.id == sub_stage_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Sub-stage {} not found", sub_stage_id))
            })?;

        let neighbor_index = match direction {
            SwapDirection::Up if index == 0 => {
                return Err(ServiceError::ValidationError(
                    "sub-stage is already first within its stage".to_string(),
                ));
            }
            SwapDirection::Down if index + 1 == siblings.len() => {
                return Err(ServiceError::ValidationError(
                    "sub-stage is already last within its stage".to_string(),
                ));
            }
            SwapDirection::Up => index - 1,
            SwapDirection::Down => index + 1,
        };

        let sub_order = siblings[index].sequence_order;
        let neighbor_order = siblings[neighbor_index].sequence_order;
        let neighbor_id = siblings[neighbor_index].id;
        let now = Utc::now();

        let mut moving: SubStageActiveModel = siblings[index].clone().into();
        moving.sequence_order = Set(neighbor_order);
        moving.updated_at = Set(Some(now));
        moving.update(&txn).await.map_err(|e| {
            error!(error = %e, sub_stage_id = %sub_stage_id, "Failed to reorder sub-stage");
            ServiceError::DatabaseError(e)
        })?;

        let mut neighbor: SubStageActiveModel = siblings[neighbor_index].clone().into();
        neighbor.sequence_order = Set(sub_order);
        neighbor.updated_at = Set(Some(now));
        neighbor.update(&txn).await.map_err(|e| {
            error!(error = %e, sub_stage_id = %neighbor_id, "Failed to reorder neighbor sub-stage");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, sub_stage_id = %sub_stage_id, "Failed to commit sub-stage reorder");
            ServiceError::DatabaseError(e)
        })?;

        info!(sub_stage_id = %sub_stage_id, swapped_with = %neighbor_id, "Sub-stage reordered");
        self.emit(Event::SubStageReordered {
            sub_stage_id,
            swapped_with: neighbor_id,
        })
        .await;

        self.list_topology(ctx.organization_id).await
    }

    /// Deletes a sub-stage, refused while any allocation still sits in it.
    #[instrument(skip(self, ctx), fields(sub_stage_id = %sub_stage_id))]
    pub async fn delete_sub_stage(
        &self,
        ctx: &StaffContext,
        sub_stage_id: Uuid,
    ) -> Result<(), ServiceError> {
        self.require_manage(ctx)?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, sub_stage_id = %sub_stage_id, "Failed to start transaction for sub-stage deletion");
            ServiceError::DatabaseError(e)
        })?;

        self.find_sub_stage(&txn, ctx.organization_id, sub_stage_id)
            .await?;

        let held = StageAllocationEntity::find()
            .filter(stage_allocation::Column::SubStageId.eq(sub_stage_id))
            .count(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;
        if held > 0 {
            warn!(sub_stage_id = %sub_stage_id, allocations = held, "Refusing to delete a sub-stage holding allocations");
            return Err(ServiceError::Conflict(format!(
                "sub-stage {} still holds {} allocation(s); move them before deleting",
                sub_stage_id, held
            )));
        }

        SubStageEntity::delete_by_id(sub_stage_id)
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, sub_stage_id = %sub_stage_id, "Failed to delete sub-stage");
                ServiceError::DatabaseError(e)
            })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, sub_stage_id = %sub_stage_id, "Failed to commit sub-stage deletion");
            ServiceError::DatabaseError(e)
        })?;

        info!(sub_stage_id = %sub_stage_id, "Sub-stage deleted");
        self.emit(Event::SubStageDeleted(sub_stage_id)).await;

        Ok(())
    }

    /// The position immediately after the given one, with display names, or
    /// `None` at the end of the workflow.
    #[instrument(skip(self), fields(organization_id = %organization_id, stage_id = %stage_id))]
    pub async fn next_from(
        &self,
        organization_id: Uuid,
        stage_id: Uuid,
        sub_stage_id: Option<Uuid>,
    ) -> Result<Option<FlatPosition>, ServiceError> {
        let topology = load_topology(&*self.db_pool, organization_id).await?;
        let current = Position {
            stage_id,
            sub_stage_id,
        };
        let next = workflow::next_position(&topology, &current)?;
        Ok(next.and_then(|pos| describe_position(&topology, &pos)))
    }

    /// Every position strictly after the given one, in workflow order.
    #[instrument(skip(self), fields(organization_id = %organization_id, stage_id = %stage_id))]
    pub async fn subsequent_from(
        &self,
        organization_id: Uuid,
        stage_id: Uuid,
        sub_stage_id: Option<Uuid>,
    ) -> Result<Vec<FlatPosition>, ServiceError> {
        let topology = load_topology(&*self.db_pool, organization_id).await?;
        let current = Position {
            stage_id,
            sub_stage_id,
        };
        Ok(workflow::subsequent_positions(&topology, &current)?)
    }

    async fn find_stage<C: ConnectionTrait>(
        &self,
        conn: &C,
        organization_id: Uuid,
        stage_id: Uuid,
    ) -> Result<stage::Model, ServiceError> {
        StageEntity::find_by_id(stage_id)
            .filter(stage::Column::OrganizationId.eq(organization_id))
            .one(conn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                warn!(stage_id = %stage_id, "Stage not found");
                ServiceError::NotFound(format!("Stage {} not found", stage_id))
            })
    }

    /// Resolves a sub-stage while verifying its parent belongs to the
    /// organization.
    async fn find_sub_stage<C: ConnectionTrait>(
        &self,
        conn: &C,
        organization_id: Uuid,
        sub_stage_id: Uuid,
    ) -> Result<sub_stage::Model, ServiceError> {
        let sub = SubStageEntity::find_by_id(sub_stage_id)
            .one(conn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                warn!(sub_stage_id = %sub_stage_id, "Sub-stage not found");
                ServiceError::NotFound(format!("Sub-stage {} not found", sub_stage_id))
            })?;
        self.find_stage(conn, organization_id, sub.stage_id).await?;
        Ok(sub)
    }

    async fn emit(&self, event: Event) {
        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(event).await {
                warn!(error = %e, "Failed to send stage event");
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum SwapDirection {
    Up,
    Down,
}

/// Display fields for a resolved position, looked up from the flattened walk.
pub(crate) fn describe_position(stages: &[StageNode], pos: &Position) -> Option<FlatPosition> {
    workflow::flatten(stages)
        .into_iter()
        .find(|flat| flat.position() == *pos)
}
