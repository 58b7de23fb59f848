use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use uuid::Uuid;

use crate::auth::StaffContext;
use crate::errors::ServiceError;
use crate::services::history::HistoryEntryView;
use crate::{ApiResponse, AppState, ListQuery, PaginatedResponse};

#[utoipa::path(
    get,
    path = "/api/v1/items/{id}/history",
    summary = "Browse one item's movement trail",
    description = "Newest entries first; stage names resolve to null for positions deleted since the move",
    params(
        ("id" = Uuid, Path, description = "Item id"),
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Entries per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "History retrieved", body = ApiResponse<PaginatedResponse<HistoryEntryView>>),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn item_history(
    State(state): State<AppState>,
    staff: StaffContext,
    Path(id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<HistoryEntryView>>>, ServiceError> {
    let (entries, total) = state
        .services
        .history
        .list_item_history(&staff, id, query.page, query.limit)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        entries, total, &query,
    ))))
}
