use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};

use crate::auth::StaffContext;
use crate::errors::ServiceError;
use crate::services::history::HistoryEntryView;
use crate::services::movements::{
    AllocateRequest, BatchMoveReport, BatchOutcome, ForwardMoveRequest, ReworkRequest,
};
use crate::{ApiResponse, AppState, ListQuery, PaginatedResponse};

/// Batch movement endpoints answer 200 when every item moved, 207 when the
/// batch split between successes and failures, and 500 when nothing moved.
fn report_response(report: BatchMoveReport) -> impl IntoResponse {
    let status = match report.outcome() {
        BatchOutcome::AllSucceeded => StatusCode::OK,
        BatchOutcome::Partial => StatusCode::MULTI_STATUS,
        BatchOutcome::AllFailed => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(report))
}

#[utoipa::path(
    post,
    path = "/api/v1/movements/allocate",
    summary = "Allocate quantities from the new pool",
    description = "Places unallocated quantity onto a stage position; the first position when no target is given",
    request_body = AllocateRequest,
    responses(
        (status = 200, description = "Every item allocated", body = BatchMoveReport),
        (status = 207, description = "Some items allocated, some failed", body = BatchMoveReport),
        (status = 400, description = "Malformed request", body = crate::errors::ErrorResponse),
        (status = 500, description = "No item allocated", body = BatchMoveReport),
    ),
    security(("Bearer" = []))
)]
pub async fn allocate(
    State(state): State<AppState>,
    staff: StaffContext,
    Json(request): Json<AllocateRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let report = state.services.movements.allocate(&staff, request).await?;
    Ok(report_response(report))
}

#[utoipa::path(
    post,
    path = "/api/v1/movements/forward",
    summary = "Move quantities forward through the workflow",
    description = "Without a target each item advances one position from its latest allocation; with a target the engine picks a source strictly before it",
    request_body = ForwardMoveRequest,
    responses(
        (status = 200, description = "Every item moved", body = BatchMoveReport),
        (status = 207, description = "Some items moved, some failed", body = BatchMoveReport),
        (status = 400, description = "Malformed request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown target position", body = crate::errors::ErrorResponse),
        (status = 500, description = "No item moved", body = BatchMoveReport),
    ),
    security(("Bearer" = []))
)]
pub async fn move_forward(
    State(state): State<AppState>,
    staff: StaffContext,
    Json(request): Json<ForwardMoveRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let report = state
        .services
        .movements
        .move_forward(&staff, request)
        .await?;
    Ok(report_response(report))
}

#[utoipa::path(
    post,
    path = "/api/v1/movements/rework",
    summary = "Send quantities backward for rework",
    description = "Each item states the exact source position; the rework target must sit strictly before it and a reason is mandatory",
    request_body = ReworkRequest,
    responses(
        (status = 200, description = "Every item sent back", body = BatchMoveReport),
        (status = 207, description = "Some items sent back, some failed", body = BatchMoveReport),
        (status = 400, description = "Malformed request or missing reason", body = crate::errors::ErrorResponse),
        (status = 500, description = "No item sent back", body = BatchMoveReport),
    ),
    security(("Bearer" = []))
)]
pub async fn rework(
    State(state): State<AppState>,
    staff: StaffContext,
    Json(request): Json<ReworkRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let report = state.services.movements.rework(&staff, request).await?;
    Ok(report_response(report))
}

#[utoipa::path(
    get,
    path = "/api/v1/movements/history",
    summary = "Browse the organization's movement trail",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Entries per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "History retrieved", body = ApiResponse<PaginatedResponse<HistoryEntryView>>),
    ),
    security(("Bearer" = []))
)]
pub async fn org_history(
    State(state): State<AppState>,
    staff: StaffContext,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<HistoryEntryView>>>, ServiceError> {
    let (entries, total) = state
        .services
        .history
        .list_org_history(&staff, query.page, query.limit)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        entries, total, &query,
    ))))
}
