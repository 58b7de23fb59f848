use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;

use crate::auth::StaffContext;
use crate::errors::ServiceError;
use crate::services::orders::{CreateOrderRequest, ItemDetail, OrderDetail, OrderSummary};
use crate::{ApiResponse, AppState, ListQuery, PaginatedResponse};

#[utoipa::path(
    post,
    path = "/api/v1/orders",
    summary = "Register an export order",
    description = "Creates the order with its item lines; quantities enter the workflow later via allocation",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order registered", body = ApiResponse<OrderDetail>),
        (status = 400, description = "Malformed request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order number already registered", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_order(
    State(state): State<AppState>,
    staff: StaffContext,
    Json(request): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.orders.create_order(&staff, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(order))))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders",
    summary = "List export orders",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Orders per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "Orders retrieved", body = ApiResponse<PaginatedResponse<OrderSummary>>),
    ),
    security(("Bearer" = []))
)]
pub async fn list_orders(
    State(state): State<AppState>,
    staff: StaffContext,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<OrderSummary>>>, ServiceError> {
    let (orders, total) = state
        .services
        .orders
        .list_orders(&staff, query.page, query.limit)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        orders, total, &query,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    summary = "Fetch one order with its items",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order retrieved", body = ApiResponse<OrderDetail>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_order(
    State(state): State<AppState>,
    staff: StaffContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderDetail>>, ServiceError> {
    let order = state.services.orders.get_order(&staff, id).await?;
    Ok(Json(ApiResponse::success(order)))
}

#[utoipa::path(
    get,
    path = "/api/v1/items/{id}",
    summary = "Fetch one item with its allocation spread",
    params(("id" = Uuid, Path, description = "Item id")),
    responses(
        (status = 200, description = "Item retrieved", body = ApiResponse<ItemDetail>),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_item(
    State(state): State<AppState>,
    staff: StaffContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ItemDetail>>, ServiceError> {
    let item = state.services.orders.get_item(&staff, id).await?;
    Ok(Json(ApiResponse::success(item)))
}
