use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::StaffContext;
use crate::entities::{stage, sub_stage};
use crate::errors::ServiceError;
use crate::services::stages::{
    CreateStageRequest, CreateSubStageRequest, UpdateStageRequest, UpdateSubStageRequest,
};
use crate::workflow::{FlatPosition, StageNode};
use crate::{ApiResponse, AppState};

/// A stage row as returned to clients; the organization scope stays
/// implicit in the caller's token.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StageView {
    pub id: Uuid,
    pub name: String,
    pub sequence_order: i32,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<stage::Model> for StageView {
    fn from(model: stage::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            sequence_order: model.sequence_order,
            location: model.location,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubStageView {
    pub id: Uuid,
    pub stage_id: Uuid,
    pub name: String,
    pub sequence_order: i32,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<sub_stage::Model> for SubStageView {
    fn from(model: sub_stage::Model) -> Self {
        Self {
            id: model.id,
            stage_id: model.stage_id,
            name: model.name,
            sequence_order: model.sequence_order,
            location: model.location,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PositionQuery {
    pub stage_id: Uuid,
    pub sub_stage_id: Option<Uuid>,
}

#[utoipa::path(
    get,
    path = "/api/v1/stages",
    summary = "List the workflow topology",
    description = "All stages in sequence order with their nested sub-stages",
    responses(
        (status = 200, description = "Topology retrieved", body = ApiResponse<Vec<StageNode>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn list_stages(
    State(state): State<AppState>,
    staff: StaffContext,
) -> Result<Json<ApiResponse<Vec<StageNode>>>, ServiceError> {
    let topology = state
        .services
        .stages
        .list_topology(staff.organization_id)
        .await?;
    Ok(Json(ApiResponse::success(topology)))
}

#[utoipa::path(
    post,
    path = "/api/v1/stages",
    summary = "Create a stage",
    request_body = CreateStageRequest,
    responses(
        (status = 201, description = "Stage created", body = ApiResponse<StageView>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_stage(
    State(state): State<AppState>,
    staff: StaffContext,
    Json(request): Json<CreateStageRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.services.stages.create_stage(&staff, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(StageView::from(created))),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/stages/{id}",
    summary = "Rename or relocate a stage",
    params(("id" = Uuid, Path, description = "Stage id")),
    request_body = UpdateStageRequest,
    responses(
        (status = 200, description = "Stage updated", body = ApiResponse<StageView>),
        (status = 404, description = "Stage not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_stage(
    State(state): State<AppState>,
    staff: StaffContext,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStageRequest>,
) -> Result<Json<ApiResponse<StageView>>, ServiceError> {
    let updated = state
        .services
        .stages
        .update_stage(&staff, id, request)
        .await?;
    Ok(Json(ApiResponse::success(StageView::from(updated))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/stages/{id}",
    summary = "Delete an empty stage",
    params(("id" = Uuid, Path, description = "Stage id")),
    responses(
        (status = 200, description = "Stage deleted", body = ApiResponse<String>),
        (status = 404, description = "Stage not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Stage still holds allocations", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_stage(
    State(state): State<AppState>,
    staff: StaffContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<String>>, ServiceError> {
    state.services.stages.delete_stage(&staff, id).await?;
    Ok(Json(ApiResponse::success(format!("Stage {} deleted", id))))
}

#[utoipa::path(
    post,
    path = "/api/v1/stages/{id}/move-up",
    summary = "Swap a stage with its predecessor",
    params(("id" = Uuid, Path, description = "Stage id")),
    responses(
        (status = 200, description = "Topology after the swap", body = ApiResponse<Vec<StageNode>>),
        (status = 400, description = "Stage is already first", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn move_stage_up(
    State(state): State<AppState>,
    staff: StaffContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<StageNode>>>, ServiceError> {
    let topology = state.services.stages.move_stage_up(&staff, id).await?;
    Ok(Json(ApiResponse::success(topology)))
}

#[utoipa::path(
    post,
    path = "/api/v1/stages/{id}/move-down",
    summary = "Swap a stage with its successor",
    params(("id" = Uuid, Path, description = "Stage id")),
    responses(
        (status = 200, description = "Topology after the swap", body = ApiResponse<Vec<StageNode>>),
        (status = 400, description = "Stage is already last", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn move_stage_down(
    State(state): State<AppState>,
    staff: StaffContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<StageNode>>>, ServiceError> {
    let topology = state.services.stages.move_stage_down(&staff, id).await?;
    Ok(Json(ApiResponse::success(topology)))
}

#[utoipa::path(
    post,
    path = "/api/v1/stages/{id}/sub-stages",
    summary = "Add a sub-stage to a stage",
    params(("id" = Uuid, Path, description = "Parent stage id")),
    request_body = CreateSubStageRequest,
    responses(
        (status = 201, description = "Sub-stage created", body = ApiResponse<SubStageView>),
        (status = 409, description = "Stage holds direct allocations", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_sub_stage(
    State(state): State<AppState>,
    staff: StaffContext,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateSubStageRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state
        .services
        .stages
        .create_sub_stage(&staff, id, request)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(SubStageView::from(created))),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/sub-stages/{id}",
    summary = "Rename or relocate a sub-stage",
    params(("id" = Uuid, Path, description = "Sub-stage id")),
    request_body = UpdateSubStageRequest,
    responses(
        (status = 200, description = "Sub-stage updated", body = ApiResponse<SubStageView>),
        (status = 404, description = "Sub-stage not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_sub_stage(
    State(state): State<AppState>,
    staff: StaffContext,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateSubStageRequest>,
) -> Result<Json<ApiResponse<SubStageView>>, ServiceError> {
    let updated = state
        .services
        .stages
        .update_sub_stage(&staff, id, request)
        .await?;
    Ok(Json(ApiResponse::success(SubStageView::from(updated))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/sub-stages/{id}",
    summary = "Delete an empty sub-stage",
    params(("id" = Uuid, Path, description = "Sub-stage id")),
    responses(
        (status = 200, description = "Sub-stage deleted", body = ApiResponse<String>),
        (status = 409, description = "Sub-stage still holds allocations", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_sub_stage(
    State(state): State<AppState>,
    staff: StaffContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<String>>, ServiceError> {
    state.services.stages.delete_sub_stage(&staff, id).await?;
    Ok(Json(ApiResponse::success(format!(
        "Sub-stage {} deleted",
        id
    ))))
}

#[utoipa::path(
    post,
    path = "/api/v1/sub-stages/{id}/move-up",
    summary = "Swap a sub-stage with its predecessor",
    params(("id" = Uuid, Path, description = "Sub-stage id")),
    responses(
        (status = 200, description = "Topology after the swap", body = ApiResponse<Vec<StageNode>>),
    ),
    security(("Bearer" = []))
)]
pub async fn move_sub_stage_up(
    State(state): State<AppState>,
    staff: StaffContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<StageNode>>>, ServiceError> {
    let topology = state.services.stages.move_sub_stage_up(&staff, id).await?;
    Ok(Json(ApiResponse::success(topology)))
}

#[utoipa::path(
    post,
    path = "/api/v1/sub-stages/{id}/move-down",
    summary = "Swap a sub-stage with its successor",
    params(("id" = Uuid, Path, description = "Sub-stage id")),
    responses(
        (status = 200, description = "Topology after the swap", body = ApiResponse<Vec<StageNode>>),
    ),
    security(("Bearer" = []))
)]
pub async fn move_sub_stage_down(
    State(state): State<AppState>,
    staff: StaffContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<StageNode>>>, ServiceError> {
    let topology = state
        .services
        .stages
        .move_sub_stage_down(&staff, id)
        .await?;
    Ok(Json(ApiResponse::success(topology)))
}

#[utoipa::path(
    get,
    path = "/api/v1/stages/next",
    summary = "Resolve the position after the given one",
    description = "Sub-stages walk before the stages that follow them; returns null at the end of the workflow",
    params(
        ("stage_id" = Uuid, Query, description = "Current stage"),
        ("sub_stage_id" = Option<Uuid>, Query, description = "Current sub-stage"),
    ),
    responses(
        (status = 200, description = "Next position, if any", body = ApiResponse<Option<FlatPosition>>),
        (status = 404, description = "Unknown position", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn next_position(
    State(state): State<AppState>,
    staff: StaffContext,
    Query(query): Query<PositionQuery>,
) -> Result<Json<ApiResponse<Option<FlatPosition>>>, ServiceError> {
    let next = state
        .services
        .stages
        .next_from(staff.organization_id, query.stage_id, query.sub_stage_id)
        .await?;
    Ok(Json(ApiResponse::success(next)))
}

#[utoipa::path(
    get,
    path = "/api/v1/stages/subsequent",
    summary = "List every position strictly after the given one",
    params(
        ("stage_id" = Uuid, Query, description = "Current stage"),
        ("sub_stage_id" = Option<Uuid>, Query, description = "Current sub-stage"),
    ),
    responses(
        (status = 200, description = "Flattened positions in workflow order", body = ApiResponse<Vec<FlatPosition>>),
        (status = 404, description = "Unknown position", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn subsequent_positions(
    State(state): State<AppState>,
    staff: StaffContext,
    Query(query): Query<PositionQuery>,
) -> Result<Json<ApiResponse<Vec<FlatPosition>>>, ServiceError> {
    let positions = state
        .services
        .stages
        .subsequent_from(staff.organization_id, query.stage_id, query.sub_stage_id)
        .await?;
    Ok(Json(ApiResponse::success(positions)))
}
