//! The movement engine. Every mutation of the allocation ledger happens
//! here: first allocations out of an item's new pool, forward moves along
//! the workflow, and rework sends backward. Each item in a batch runs in its
//! own serializable transaction; failures never abort sibling items.

use crate::{
    auth::StaffContext,
    db::{self, DbPool},
    entities::movement_history::ActiveModel as HistoryActiveModel,
    entities::order_item::{self, Entity as OrderItemEntity},
    entities::stage_allocation::{
        self, ActiveModel as AllocationActiveModel, Entity as StageAllocationEntity,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::stages::load_topology,
    workflow::{self, Position, StageNode},
};
use chrono::Utc;
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, DbErr, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct MoveItemRequest {
    pub id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ForwardMoveRequest {
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<MoveItemRequest>,
    /// Omitted: each item advances one position from its latest allocation.
    pub target_stage_id: Option<Uuid>,
    pub target_sub_stage_id: Option<Uuid>,
    /// Preferred stage to draw quantity from when several could cover the
    /// request.
    pub source_stage_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct AllocateRequest {
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<MoveItemRequest>,
    /// Omitted: quantities land on the workflow's first position.
    pub target_stage_id: Option<Uuid>,
    pub target_sub_stage_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReworkItemRequest {
    pub id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
    /// The exact position the quantity comes back from.
    pub source_stage_id: Uuid,
    pub source_sub_stage_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReworkRequest {
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<ReworkItemRequest>,
    #[validate(length(min = 3, max = 255, message = "Rework reason must be 3-255 characters"))]
    pub rework_reason: String,
    pub target_rework_stage_id: Uuid,
    pub target_rework_sub_stage_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MoveResult {
    pub item_id: Uuid,
    pub status: String,
    pub to_stage_id: Uuid,
    pub to_sub_stage_id: Option<Uuid>,
}

impl MoveResult {
    fn from_applied(applied: &AppliedMove, status: &str) -> Self {
        Self {
            item_id: applied.item_id,
            status: status.to_string(),
            to_stage_id: applied.to.stage_id,
            to_sub_stage_id: applied.to.sub_stage_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MoveError {
    pub item_id: Uuid,
    pub error: String,
}

/// Per-batch report: items that moved and items that were rejected, side by
/// side.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BatchMoveReport {
    pub message: String,
    pub results: Vec<MoveResult>,
    pub errors: Vec<MoveError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    AllSucceeded,
    Partial,
    AllFailed,
}

impl BatchMoveReport {
    pub fn outcome(&self) -> BatchOutcome {
        if self.errors.is_empty() {
            BatchOutcome::AllSucceeded
        } else if self.results.is_empty() {
            BatchOutcome::AllFailed
        } else {
            BatchOutcome::Partial
        }
    }
}

/// How the engine picks the allocation a forward move draws from.
#[derive(Debug, Clone)]
enum SourceStrategy {
    /// No explicit target: draw from the item's most recently created
    /// allocation and advance it one position.
    Latest,
    /// The caller picked a target: draw from an allocation strictly before
    /// it that covers the whole requested quantity on its own.
    ExplicitTarget {
        target: Position,
        preferred_source_stage: Option<Uuid>,
    },
}

/// A committed ledger mutation, reported back to the batch loop.
#[derive(Debug, Clone)]
struct AppliedMove {
    item_id: Uuid,
    from: Option<Position>,
    to: Position,
    quantity: i32,
    completed: bool,
}

#[derive(Clone)]
pub struct MovementService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl MovementService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    fn require_move(&self, ctx: &StaffContext) -> Result<(), ServiceError> {
        if !ctx.role.can_move_items() {
            return Err(ServiceError::Forbidden(
                "this role cannot move items between stages".to_string(),
            ));
        }
        Ok(())
    }

    /// Moves quantities forward through the workflow, one serializable
    /// transaction per item.
    #[instrument(skip(self, ctx, request), fields(organization_id = %ctx.organization_id, items = request.items.len()))]
    pub async fn move_forward(
        &self,
        ctx: &StaffContext,
        request: ForwardMoveRequest,
    ) -> Result<BatchMoveReport, ServiceError> {
        self.require_move(ctx)?;
        request.validate()?;
        for entry in &request.items {
            entry.validate()?;
        }

        let topology = load_topology(&*self.db_pool, ctx.organization_id).await?;
        let target = match request.target_stage_id {
            Some(stage_id) => Some(workflow::resolve_target(
                &topology,
                stage_id,
                request.target_sub_stage_id,
            )?),
            None if request.target_sub_stage_id.is_some() => {
                return Err(ServiceError::ValidationError(
                    "target_sub_stage_id requires target_stage_id".to_string(),
                ));
            }
            None => None,
        };

        let mut results = Vec::new();
        let mut errors = Vec::new();
        for entry in &request.items {
            let outcome = {
                let topology = topology.clone();
                let ctx = ctx.clone();
                let entry = entry.clone();
                let preferred = request.source_stage_id;
                db::serializable(&self.db_pool, move |txn| {
                    Box::pin(async move {
                        forward_one(txn, &topology, &ctx, &entry, target, preferred).await
                    })
                })
                .await
            };
            match outcome {
                Ok(applied) => {
                    counter!("stageline_movements.forward.applied", 1);
                    info!(
                        item_id = %applied.item_id,
                        to_stage_id = %applied.to.stage_id,
                        quantity = applied.quantity,
                        "Item moved forward"
                    );
                    if let Some(from) = applied.from {
                        self.emit(Event::ItemMoved {
                            item_id: applied.item_id,
                            from_stage_id: from.stage_id,
                            from_sub_stage_id: from.sub_stage_id,
                            to_stage_id: applied.to.stage_id,
                            to_sub_stage_id: applied.to.sub_stage_id,
                            quantity: applied.quantity,
                        })
                        .await;
                    }
                    self.emit_completion(&applied).await;
                    results.push(MoveResult::from_applied(&applied, "moved"));
                }
                Err(e) => {
                    note_rejection(entry.id, &e);
                    errors.push(MoveError {
                        item_id: entry.id,
                        error: e.response_message(),
                    });
                }
            }
        }

        Ok(finish("moved", results, errors))
    }

    /// First allocation out of the new pool into a stage position.
    #[instrument(skip(self, ctx, request), fields(organization_id = %ctx.organization_id, items = request.items.len()))]
    pub async fn allocate(
        &self,
        ctx: &StaffContext,
        request: AllocateRequest,
    ) -> Result<BatchMoveReport, ServiceError> {
        self.require_move(ctx)?;
        request.validate()?;
        for entry in &request.items {
            entry.validate()?;
        }

        let topology = load_topology(&*self.db_pool, ctx.organization_id).await?;
        let target = match request.target_stage_id {
            Some(stage_id) => {
                workflow::resolve_target(&topology, stage_id, request.target_sub_stage_id)?
            }
            None if request.target_sub_stage_id.is_some() => {
                return Err(ServiceError::ValidationError(
                    "target_sub_stage_id requires target_stage_id".to_string(),
                ));
            }
            None => workflow::first_position(&topology).ok_or_else(|| {
                ServiceError::ValidationError(
                    "the organization has no workflow stages configured".to_string(),
                )
            })?,
        };

        let mut results = Vec::new();
        let mut errors = Vec::new();
        for entry in &request.items {
            let outcome = {
                let topology = topology.clone();
                let ctx = ctx.clone();
                let entry = entry.clone();
                db::serializable(&self.db_pool, move |txn| {
                    Box::pin(async move { allocate_one(txn, &topology, &ctx, &entry, target).await })
                })
                .await
            };
            match outcome {
                Ok(applied) => {
                    counter!("stageline_movements.allocations.applied", 1);
                    info!(
                        item_id = %applied.item_id,
                        to_stage_id = %applied.to.stage_id,
                        quantity = applied.quantity,
                        "Item allocated from the new pool"
                    );
                    self.emit(Event::ItemAllocated {
                        item_id: applied.item_id,
                        stage_id: applied.to.stage_id,
                        sub_stage_id: applied.to.sub_stage_id,
                        quantity: applied.quantity,
                    })
                    .await;
                    self.emit_completion(&applied).await;
                    results.push(MoveResult::from_applied(&applied, "allocated"));
                }
                Err(e) => {
                    note_rejection(entry.id, &e);
                    errors.push(MoveError {
                        item_id: entry.id,
                        error: e.response_message(),
                    });
                }
            }
        }

        Ok(finish("allocated", results, errors))
    }

    /// Sends quantities backward for rework. The target must sit strictly
    /// before each item's stated source position.
    #[instrument(skip(self, ctx, request), fields(organization_id = %ctx.organization_id, items = request.items.len()))]
    pub async fn rework(
        &self,
        ctx: &StaffContext,
        request: ReworkRequest,
    ) -> Result<BatchMoveReport, ServiceError> {
        self.require_move(ctx)?;
        request.validate()?;
        for entry in &request.items {
            entry.validate()?;
        }

        let topology = load_topology(&*self.db_pool, ctx.organization_id).await?;
        let target = workflow::resolve_target(
            &topology,
            request.target_rework_stage_id,
            request.target_rework_sub_stage_id,
        )?;

        let mut results = Vec::new();
        let mut errors = Vec::new();
        for entry in &request.items {
            let outcome = {
                let topology = topology.clone();
                let ctx = ctx.clone();
                let entry = entry.clone();
                let reason = request.rework_reason.clone();
                db::serializable(&self.db_pool, move |txn| {
                    Box::pin(async move {
                        rework_one(txn, &topology, &ctx, &entry, target, &reason).await
                    })
                })
                .await
            };
            match outcome {
                Ok(applied) => {
                    counter!("stageline_movements.rework.applied", 1);
                    info!(
                        item_id = %applied.item_id,
                        to_stage_id = %applied.to.stage_id,
                        quantity = applied.quantity,
                        "Item sent back for rework"
                    );
                    if let Some(from) = applied.from {
                        self.emit(Event::ItemReworked {
                            item_id: applied.item_id,
                            from_stage_id: from.stage_id,
                            to_stage_id: applied.to.stage_id,
                            quantity: applied.quantity,
                            reason: request.rework_reason.clone(),
                        })
                        .await;
                    }
                    results.push(MoveResult::from_applied(&applied, "reworked"));
                }
                Err(e) => {
                    note_rejection(entry.id, &e);
                    errors.push(MoveError {
                        item_id: entry.id,
                        error: e.response_message(),
                    });
                }
            }
        }

        Ok(finish("reworked", results, errors))
    }

    async fn emit(&self, event: Event) {
        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(event).await {
                warn!(error = %e, "Failed to send movement event");
            }
        }
    }

    async fn emit_completion(&self, applied: &AppliedMove) {
        if applied.completed {
            self.emit(Event::ItemCompleted {
                item_id: applied.item_id,
                completed_at: Utc::now(),
            })
            .await;
        }
    }
}

// Per-item pipeline steps. These run inside the item's transaction and are
// free functions so the closures passed to `db::serializable` own all their
// data.

async fn forward_one(
    txn: &DatabaseTransaction,
    topology: &[StageNode],
    ctx: &StaffContext,
    entry: &MoveItemRequest,
    target: Option<Position>,
    preferred_source_stage: Option<Uuid>,
) -> Result<AppliedMove, ServiceError> {
    let item = load_item(txn, ctx.organization_id, entry.id).await?;
    let rows = load_allocations(txn, entry.id).await?;

    let strategy = match target {
        Some(target) => SourceStrategy::ExplicitTarget {
            target,
            preferred_source_stage,
        },
        None => SourceStrategy::Latest,
    };
    let (source, target) = select_source(topology, &rows, &strategy, entry.quantity, entry.id)?;

    // The strategies only produce strictly-forward pairs; verified once more
    // before anything is written.
    let from = position_of(source);
    if workflow::compare_positions(topology, &from, &target)? != Ordering::Less {
        return Err(ServiceError::OrderingViolation(format!(
            "item {}: target must sit strictly after the source position",
            entry.id
        )));
    }

    apply_move(
        txn,
        &item,
        topology,
        Some(source.clone()),
        target,
        entry.quantity,
        ctx.staff_id,
        None,
    )
    .await
}

async fn allocate_one(
    txn: &DatabaseTransaction,
    topology: &[StageNode],
    ctx: &StaffContext,
    entry: &MoveItemRequest,
    target: Position,
) -> Result<AppliedMove, ServiceError> {
    let item = load_item(txn, ctx.organization_id, entry.id).await?;
    let rows = load_allocations(txn, entry.id).await?;

    let allocated: i64 = rows.iter().map(|r| i64::from(r.quantity)).sum();
    let pool = i64::from(item.total_quantity) - allocated;
    if i64::from(entry.quantity) > pool {
        return Err(ServiceError::InsufficientQuantity(format!(
            "item {}: requested {} but only {} remain unallocated",
            entry.id, entry.quantity, pool
        )));
    }

    apply_move(
        txn,
        &item,
        topology,
        None,
        target,
        entry.quantity,
        ctx.staff_id,
        None,
    )
    .await
}

async fn rework_one(
    txn: &DatabaseTransaction,
    topology: &[StageNode],
    ctx: &StaffContext,
    entry: &ReworkItemRequest,
    target: Position,
    reason: &str,
) -> Result<AppliedMove, ServiceError> {
    let item = load_item(txn, ctx.organization_id, entry.id).await?;
    let source_pos =
        workflow::resolve_exact(topology, entry.source_stage_id, entry.source_sub_stage_id)?;

    // Rework only ever travels backward.
    if workflow::compare_positions(topology, &target, &source_pos)? != Ordering::Less {
        return Err(ServiceError::OrderingViolation(format!(
            "item {}: rework target must sit strictly before the source position",
            entry.id
        )));
    }

    let rows = load_allocations(txn, entry.id).await?;
    let mut matching: Vec<stage_allocation::Model> = rows
        .into_iter()
        .filter(|r| position_of(r) == source_pos)
        .collect();
    if matching.len() > 1 {
        return Err(ServiceError::DataInconsistency(format!(
            "item {}: {} allocation rows share the source position (stage {}, sub-stage {:?})",
            entry.id,
            matching.len(),
            source_pos.stage_id,
            source_pos.sub_stage_id
        )));
    }
    let source = matching.pop().ok_or_else(|| {
        ServiceError::NoEligibleSource(format!(
            "item {} holds no allocation at the stated source position",
            entry.id
        ))
    })?;

    if entry.quantity > source.quantity {
        return Err(ServiceError::InsufficientQuantity(format!(
            "item {}: requested {} but the source allocation holds {}",
            entry.id, entry.quantity, source.quantity
        )));
    }

    apply_move(
        txn,
        &item,
        topology,
        Some(source),
        target,
        entry.quantity,
        ctx.staff_id,
        Some(reason.to_string()),
    )
    .await
}

/// Applies one selected move: drain or decrement the source row, increment
/// or insert the target row, append the history entry. Runs entirely inside
/// the caller's transaction; a failure after the source write is classified
/// as DataInconsistency so it surfaces loudly even though the transaction
/// rolls back.
#[allow(clippy::too_many_arguments)]
async fn apply_move(
    txn: &DatabaseTransaction,
    item: &order_item::Model,
    topology: &[StageNode],
    source: Option<stage_allocation::Model>,
    target: Position,
    quantity: i32,
    actor: Uuid,
    rework_reason: Option<String>,
) -> Result<AppliedMove, ServiceError> {
    let now = Utc::now();
    let from = source.as_ref().map(position_of);

    if let Some(source_row) = &source {
        // Defensive re-check against the row the transaction actually read.
        if quantity > source_row.quantity {
            return Err(ServiceError::InsufficientQuantity(format!(
                "item {}: requested {} but the source allocation holds {}",
                item.id, quantity, source_row.quantity
            )));
        }
        if quantity == source_row.quantity {
            StageAllocationEntity::delete_by_id(source_row.id)
                .exec(txn)
                .await
                .map_err(|e| {
                    error!(error = %e, item_id = %item.id, "Failed to drain source allocation");
                    ServiceError::DatabaseError(e)
                })?;
        } else {
            let mut active: AllocationActiveModel = source_row.clone().into();
            active.quantity = Set(source_row.quantity - quantity);
            active.updated_at = Set(now);
            active.update(txn).await.map_err(|e| {
                error!(error = %e, item_id = %item.id, "Failed to decrement source allocation");
                ServiceError::DatabaseError(e)
            })?;
        }
    }

    // From here on the source is already written; failures are ledger
    // inconsistencies, not plain database errors.
    let mut query = StageAllocationEntity::find()
        .filter(stage_allocation::Column::ItemId.eq(item.id))
        .filter(stage_allocation::Column::StageId.eq(target.stage_id));
    query = match target.sub_stage_id {
        Some(sub_id) => query.filter(stage_allocation::Column::SubStageId.eq(sub_id)),
        None => query.filter(stage_allocation::Column::SubStageId.is_null()),
    };
    let at_target = query
        .all(txn)
        .await
        .map_err(|e| mid_apply_failure(item.id, "target lookup", e))?;

    if at_target.len() > 1 {
        return Err(ServiceError::DataInconsistency(format!(
            "item {}: {} allocation rows share position (stage {}, sub-stage {:?})",
            item.id,
            at_target.len(),
            target.stage_id,
            target.sub_stage_id
        )));
    }

    match at_target.into_iter().next() {
        Some(existing) => {
            let merged = existing.quantity + quantity;
            let mut active: AllocationActiveModel = existing.into();
            active.quantity = Set(merged);
            active.moved_by = Set(actor);
            active.updated_at = Set(now);
            active
                .update(txn)
                .await
                .map_err(|e| mid_apply_failure(item.id, "target increment", e))?;
        }
        None => {
            let active = AllocationActiveModel {
                id: Set(Uuid::new_v4()),
                item_id: Set(item.id),
                organization_id: Set(item.organization_id),
                stage_id: Set(target.stage_id),
                sub_stage_id: Set(target.sub_stage_id),
                quantity: Set(quantity),
                moved_by: Set(actor),
                created_at: Set(now),
                updated_at: Set(now),
            };
            active
                .insert(txn)
                .await
                .map_err(|e| mid_apply_failure(item.id, "target insert", e))?;
        }
    }

    let history = HistoryActiveModel {
        id: Set(Uuid::new_v4()),
        item_id: Set(item.id),
        organization_id: Set(item.organization_id),
        from_stage_id: Set(from.map(|p| p.stage_id)),
        from_sub_stage_id: Set(from.and_then(|p| p.sub_stage_id)),
        to_stage_id: Set(target.stage_id),
        to_sub_stage_id: Set(target.sub_stage_id),
        quantity: Set(quantity),
        moved_at: Set(now),
        moved_by: Set(actor),
        rework_reason: Set(rework_reason),
    };
    history
        .insert(txn)
        .await
        .map_err(|e| mid_apply_failure(item.id, "history append", e))?;

    // Ledger self-check before the transaction commits.
    let rows = load_allocations(txn, item.id).await?;
    let allocated: i64 = rows.iter().map(|r| i64::from(r.quantity)).sum();
    if allocated > i64::from(item.total_quantity) {
        return Err(ServiceError::DataInconsistency(format!(
            "item {}: allocations total {} exceeds the item quantity {}",
            item.id, allocated, item.total_quantity
        )));
    }

    let completed = allocated == i64::from(item.total_quantity)
        && workflow::final_position(topology)
            .map(|last| rows.iter().all(|r| position_of(r) == last))
            .unwrap_or(false);

    Ok(AppliedMove {
        item_id: item.id,
        from,
        to: target,
        quantity,
        completed,
    })
}

fn mid_apply_failure(item_id: Uuid, step: &str, e: DbErr) -> ServiceError {
    error!(error = %e, item_id = %item_id, step = step, "Move failed mid-apply; transaction rolled back");
    ServiceError::DataInconsistency(format!(
        "item {}: {} failed after the source was written; the move was rolled back",
        item_id, step
    ))
}

/// Picks the source allocation (and, for the Latest strategy, the target)
/// for one forward move. Pure over the loaded rows.
fn select_source<'a>(
    topology: &[StageNode],
    rows: &'a [stage_allocation::Model],
    strategy: &SourceStrategy,
    quantity: i32,
    item_id: Uuid,
) -> Result<(&'a stage_allocation::Model, Position), ServiceError> {
    if rows.is_empty() {
        return Err(ServiceError::NoEligibleSource(format!(
            "item {} holds no allocations to move from",
            item_id
        )));
    }

    match strategy {
        SourceStrategy::Latest => {
            let source = rows
                .iter()
                .max_by_key(|r| (r.created_at, r.id))
                .ok_or_else(|| {
                    ServiceError::NoEligibleSource(format!(
                        "item {} holds no allocations to move from",
                        item_id
                    ))
                })?;
            if quantity > source.quantity {
                return Err(ServiceError::InsufficientQuantity(format!(
                    "item {}: requested {} but the latest allocation holds {}",
                    item_id, quantity, source.quantity
                )));
            }
            let from = position_of(source);
            let target = workflow::next_position(topology, &from)?.ok_or_else(|| {
                ServiceError::OrderingViolation(format!(
                    "item {} is already at the final workflow position",
                    item_id
                ))
            })?;
            Ok((source, target))
        }
        SourceStrategy::ExplicitTarget {
            target,
            preferred_source_stage,
        } => {
            let mut before: Vec<&stage_allocation::Model> = Vec::new();
            for row in rows {
                let pos = position_of(row);
                if workflow::compare_positions(topology, &pos, target)? == Ordering::Less {
                    before.push(row);
                }
            }
            if before.is_empty() {
                return Err(ServiceError::OrderingViolation(format!(
                    "item {}: the target does not sit strictly after any allocation it holds",
                    item_id
                )));
            }

            let covering: Vec<&stage_allocation::Model> = before
                .iter()
                .copied()
                .filter(|r| r.quantity >= quantity)
                .collect();
            if covering.is_empty() {
                let largest = before.iter().map(|r| r.quantity).max().unwrap_or(0);
                return Err(ServiceError::InsufficientQuantity(format!(
                    "item {}: requested {} but no single allocation before the target covers it (largest holds {})",
                    item_id, quantity, largest
                )));
            }

            // Honor the preferred source stage when it can cover the request,
            // otherwise drain the earliest position first.
            let pool: Vec<&stage_allocation::Model> = match preferred_source_stage {
                Some(stage_id) => {
                    let preferred: Vec<&stage_allocation::Model> = covering
                        .iter()
                        .copied()
                        .filter(|r| r.stage_id == *stage_id)
                        .collect();
                    if preferred.is_empty() {
                        covering
                    } else {
                        preferred
                    }
                }
                None => covering,
            };

            // Rows here already resolved against the topology above.
            let source = pool
                .into_iter()
                .min_by(|a, b| {
                    workflow::compare_positions(topology, &position_of(a), &position_of(b))
                        .unwrap_or(Ordering::Equal)
                })
                .ok_or_else(|| {
                    ServiceError::NoEligibleSource(format!(
                        "item {} holds no eligible source allocation",
                        item_id
                    ))
                })?;
            Ok((source, *target))
        }
    }
}

fn position_of(row: &stage_allocation::Model) -> Position {
    Position {
        stage_id: row.stage_id,
        sub_stage_id: row.sub_stage_id,
    }
}

async fn load_item(
    txn: &DatabaseTransaction,
    organization_id: Uuid,
    item_id: Uuid,
) -> Result<order_item::Model, ServiceError> {
    OrderItemEntity::find_by_id(item_id)
        .filter(order_item::Column::OrganizationId.eq(organization_id))
        .one(txn)
        .await
        .map_err(ServiceError::DatabaseError)?
        .ok_or_else(|| {
            warn!(item_id = %item_id, "Item not found");
            ServiceError::NotFound(format!("Item {} not found", item_id))
        })
}

async fn load_allocations(
    txn: &DatabaseTransaction,
    item_id: Uuid,
) -> Result<Vec<stage_allocation::Model>, ServiceError> {
    StageAllocationEntity::find()
        .filter(stage_allocation::Column::ItemId.eq(item_id))
        .all(txn)
        .await
        .map_err(ServiceError::DatabaseError)
}

fn note_rejection(item_id: Uuid, error: &ServiceError) {
    match error {
        ServiceError::DataInconsistency(_) => {
            counter!("stageline_movements.data_inconsistencies", 1);
            error!(item_id = %item_id, error = %error, "Item move failed with a ledger inconsistency");
        }
        ServiceError::OrderingViolation(_) => {
            counter!("stageline_movements.ordering_violations", 1);
            warn!(item_id = %item_id, error = %error, "Item move rejected");
        }
        _ => {
            warn!(item_id = %item_id, error = %error, "Item move rejected");
        }
    }
}

fn finish(verb: &str, results: Vec<MoveResult>, errors: Vec<MoveError>) -> BatchMoveReport {
    let message = if errors.is_empty() {
        format!("{} item(s) {}", results.len(), verb)
    } else if results.is_empty() {
        format!("no items {}; {} failed", verb, errors.len())
    } else {
        format!("{} item(s) {}, {} failed", results.len(), verb, errors.len())
    };
    BatchMoveReport {
        message,
        results,
        errors,
    }
}
