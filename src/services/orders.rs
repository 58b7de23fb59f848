//! Export order intake and read models. Orders arrive with their item
//! lines; quantities enter the workflow later through the movement engine's
//! allocate operation, so intake never touches the allocation ledger.

use crate::{
    auth::StaffContext,
    db::DbPool,
    entities::export_order::{
        self, ActiveModel as OrderActiveModel, Entity as OrderEntity, Model as OrderModel,
    },
    entities::order_item::{self, Entity as OrderItemEntity},
    entities::stage_allocation::{self, Entity as StageAllocationEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    services::stages::{describe_position, load_topology},
    workflow::{self, Position},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderItemRequest {
    #[validate(length(min = 1, max = 64, message = "SKU must be 1-64 characters"))]
    pub sku: String,
    #[validate(length(min = 1, max = 200, message = "Item name must be 1-200 characters"))]
    pub name: String,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub total_quantity: i32,
    /// Free-form line attributes (size, colour, packing notes).
    pub attributes: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 64, message = "Order number must be 1-64 characters"))]
    pub order_number: String,
    #[validate(length(max = 200, message = "Buyer name is too long"))]
    pub buyer_name: Option<String>,
    #[validate(length(max = 2000, message = "Notes are too long"))]
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<CreateOrderItemRequest>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderSummary {
    pub id: Uuid,
    pub order_number: String,
    pub buyer_name: Option<String>,
    pub item_count: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ItemSummary {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub total_quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderDetail {
    pub id: Uuid,
    pub order_number: String,
    pub buyer_name: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<ItemSummary>,
}

/// One row of an item's current spread across the workflow.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AllocationView {
    pub stage_id: Uuid,
    pub stage_name: Option<String>,
    pub sub_stage_id: Option<Uuid>,
    pub sub_stage_name: Option<String>,
    pub quantity: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ItemDetail {
    pub id: Uuid,
    pub order_id: Uuid,
    pub sku: String,
    pub name: String,
    pub total_quantity: i32,
    /// Quantity not yet allocated to any stage.
    pub new_pool: i32,
    /// True when the full quantity sits at the final workflow position.
    pub completed: bool,
    pub attributes: Option<serde_json::Value>,
    pub allocations: Vec<AllocationView>,
}

#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Registers an export order together with its item lines.
    #[instrument(skip(self, ctx, request), fields(organization_id = %ctx.organization_id, order_number = %request.order_number))]
    pub async fn create_order(
        &self,
        ctx: &StaffContext,
        request: CreateOrderRequest,
    ) -> Result<OrderDetail, ServiceError> {
        if !ctx.role.can_move_items() {
            return Err(ServiceError::Forbidden(
                "this role cannot register orders".to_string(),
            ));
        }
        request.validate()?;
        for item in &request.items {
            item.validate()?;
        }

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to begin transaction");
            ServiceError::DatabaseError(e)
        })?;

        let existing = OrderEntity::find()
            .filter(export_order::Column::OrganizationId.eq(ctx.organization_id))
            .filter(export_order::Column::OrderNumber.eq(request.order_number.clone()))
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "order number {} is already registered",
                request.order_number
            )));
        }

        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let order = OrderActiveModel {
            id: Set(order_id),
            organization_id: Set(ctx.organization_id),
            order_number: Set(request.order_number.clone()),
            buyer_name: Set(request.buyer_name.clone()),
            notes: Set(request.notes.clone()),
            created_at: Set(now),
            updated_at: Set(None),
        };
        let order = order.insert(&txn).await.map_err(|e| {
            error!(error = %e, "Failed to insert export order");
            ServiceError::DatabaseError(e)
        })?;

        let item_models: Vec<order_item::ActiveModel> = request
            .items
            .iter()
            .map(|item| order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                organization_id: Set(ctx.organization_id),
                sku: Set(item.sku.clone()),
                name: Set(item.name.clone()),
                total_quantity: Set(item.total_quantity),
                attributes: Set(item.attributes.clone()),
                created_at: Set(now),
                updated_at: Set(None),
            })
            .collect();
        OrderItemEntity::insert_many(item_models)
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to insert order items");
                ServiceError::DatabaseError(e)
            })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit order intake");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            order_id = %order_id,
            items = request.items.len(),
            "Export order registered"
        );
        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::OrderCreated {
                    order_id,
                    item_count: request.items.len(),
                })
                .await
            {
                warn!(error = %e, "Failed to send OrderCreated event");
            }
        }

        self.assemble_detail(order).await
    }

    /// Pages through the organization's orders, newest first.
    #[instrument(skip(self, ctx), fields(organization_id = %ctx.organization_id))]
    pub async fn list_orders(
        &self,
        ctx: &StaffContext,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<OrderSummary>, u64), ServiceError> {
        let db = &*self.db_pool;
        let paginator = OrderEntity::find()
            .filter(export_order::Column::OrganizationId.eq(ctx.organization_id))
            .order_by_desc(export_order::Column::CreatedAt)
            .paginate(db, per_page.max(1));
        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::DatabaseError)?;
        let orders = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::DatabaseError)?;

        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let mut counts: HashMap<Uuid, u64> = HashMap::new();
        if !order_ids.is_empty() {
            let items = OrderItemEntity::find()
                .filter(order_item::Column::OrderId.is_in(order_ids))
                .all(db)
                .await
                .map_err(ServiceError::DatabaseError)?;
            for item in items {
                *counts.entry(item.order_id).or_insert(0) += 1;
            }
        }

        let summaries = orders
            .into_iter()
            .map(|order| OrderSummary {
                item_count: counts.get(&order.id).copied().unwrap_or(0),
                id: order.id,
                order_number: order.order_number,
                buyer_name: order.buyer_name,
                created_at: order.created_at,
            })
            .collect();
        Ok((summaries, total))
    }

    #[instrument(skip(self, ctx), fields(organization_id = %ctx.organization_id, order_id = %order_id))]
    pub async fn get_order(
        &self,
        ctx: &StaffContext,
        order_id: Uuid,
    ) -> Result<OrderDetail, ServiceError> {
        let db = &*self.db_pool;
        let order = OrderEntity::find_by_id(order_id)
            .filter(export_order::Column::OrganizationId.eq(ctx.organization_id))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                warn!(order_id = %order_id, "Order not found");
                ServiceError::NotFound(format!("Order {} not found", order_id))
            })?;
        self.assemble_detail(order).await
    }

    /// An item with its allocation spread, named against the live topology.
    #[instrument(skip(self, ctx), fields(organization_id = %ctx.organization_id, item_id = %item_id))]
    pub async fn get_item(
        &self,
        ctx: &StaffContext,
        item_id: Uuid,
    ) -> Result<ItemDetail, ServiceError> {
        let db = &*self.db_pool;
        let item = OrderItemEntity::find_by_id(item_id)
            .filter(order_item::Column::OrganizationId.eq(ctx.organization_id))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                warn!(item_id = %item_id, "Item not found");
                ServiceError::NotFound(format!("Item {} not found", item_id))
            })?;

        let rows = StageAllocationEntity::find()
            .filter(stage_allocation::Column::ItemId.eq(item_id))
            .order_by_asc(stage_allocation::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;
        let topology = load_topology(db, ctx.organization_id).await?;

        let allocated: i64 = rows.iter().map(|r| i64::from(r.quantity)).sum();
        let completed = allocated == i64::from(item.total_quantity)
            && workflow::final_position(&topology)
                .map(|last| {
                    rows.iter().all(|r| {
                        Position {
                            stage_id: r.stage_id,
                            sub_stage_id: r.sub_stage_id,
                        } == last
                    })
                })
                .unwrap_or(false);
        let new_pool = item.total_quantity - allocated as i32;

        let allocations = rows
            .into_iter()
            .map(|row| {
                let pos = Position {
                    stage_id: row.stage_id,
                    sub_stage_id: row.sub_stage_id,
                };
                let flat = describe_position(&topology, &pos);
                AllocationView {
                    stage_id: row.stage_id,
                    stage_name: flat.as_ref().map(|f| f.stage_name.clone()),
                    sub_stage_id: row.sub_stage_id,
                    sub_stage_name: flat.and_then(|f| f.sub_stage_name),
                    quantity: row.quantity,
                    updated_at: row.updated_at,
                }
            })
            .collect();

        Ok(ItemDetail {
            id: item.id,
            order_id: item.order_id,
            sku: item.sku,
            name: item.name,
            total_quantity: item.total_quantity,
            new_pool,
            completed,
            attributes: item.attributes,
            allocations,
        })
    }

    async fn assemble_detail(&self, order: OrderModel) -> Result<OrderDetail, ServiceError> {
        let db = &*self.db_pool;
        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .order_by_asc(order_item::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .into_iter()
            .map(|item| ItemSummary {
                id: item.id,
                sku: item.sku,
                name: item.name,
                total_quantity: item.total_quantity,
            })
            .collect();
        Ok(OrderDetail {
            id: order.id,
            order_number: order.order_number,
            buyer_name: order.buyer_name,
            notes: order.notes,
            created_at: order.created_at,
            items,
        })
    }
}
