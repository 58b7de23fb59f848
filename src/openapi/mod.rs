use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stageline API",
        version = "0.2.0",
        description = r#"
# Stageline Export Operations API

Tracks garment export orders through a configurable production workflow.
Each organization defines an ordered list of stages (optionally subdivided
into sub-stages); item quantities move through those positions one
allocation at a time, and every movement lands in an append-only history.

## Authentication

All endpoints require a staff JWT in the Authorization header:

```
Authorization: Bearer <token>
```

Owners manage the workflow topology; owners and workers move items.

## Batch movement semantics

The movement endpoints accept several items per call and process each one
independently. The response status reflects the mix: `200` when every item
moved, `207` when the batch split, `500` when nothing moved. Per-item
failures are listed next to the successes, never instead of them.

## Pagination

List endpoints take `page` (default 1) and `limit` (default 20).
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Stages", description = "Workflow topology administration"),
        (name = "Movements", description = "Allocation, forward and rework moves"),
        (name = "Orders", description = "Export order intake and item lookups"),
        (name = "History", description = "Movement trail browsing"),
        (name = "Health", description = "Health and status endpoints")
    ),
    paths(
        // Workflow topology
        crate::handlers::stages::list_stages,
        crate::handlers::stages::create_stage,
        crate::handlers::stages::update_stage,
        crate::handlers::stages::delete_stage,
        crate::handlers::stages::move_stage_up,
        crate::handlers::stages::move_stage_down,
        crate::handlers::stages::create_sub_stage,
        crate::handlers::stages::update_sub_stage,
        crate::handlers::stages::delete_sub_stage,
        crate::handlers::stages::move_sub_stage_up,
        crate::handlers::stages::move_sub_stage_down,
        crate::handlers::stages::next_position,
        crate::handlers::stages::subsequent_positions,

        // Movements
        crate::handlers::movements::allocate,
        crate::handlers::movements::move_forward,
        crate::handlers::movements::rework,
        crate::handlers::movements::org_history,

        // Orders and items
        crate::handlers::orders::create_order,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::get_item,

        // History
        crate::handlers::history::item_history,
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,
            crate::PaginatedResponse<serde_json::Value>,
            crate::ListQuery,

            // Topology types
            crate::workflow::Position,
            crate::workflow::StageNode,
            crate::workflow::SubStageNode,
            crate::workflow::FlatPosition,
            crate::handlers::stages::StageView,
            crate::handlers::stages::SubStageView,
            crate::services::stages::CreateStageRequest,
            crate::services::stages::UpdateStageRequest,
            crate::services::stages::CreateSubStageRequest,
            crate::services::stages::UpdateSubStageRequest,

            // Movement types
            crate::services::movements::MoveItemRequest,
            crate::services::movements::ForwardMoveRequest,
            crate::services::movements::AllocateRequest,
            crate::services::movements::ReworkItemRequest,
            crate::services::movements::ReworkRequest,
            crate::services::movements::MoveResult,
            crate::services::movements::MoveError,
            crate::services::movements::BatchMoveReport,

            // Order types
            crate::services::orders::CreateOrderRequest,
            crate::services::orders::CreateOrderItemRequest,
            crate::services::orders::OrderSummary,
            crate::services::orders::OrderDetail,
            crate::services::orders::ItemSummary,
            crate::services::orders::ItemDetail,
            crate::services::orders::AllocationView,

            // History types
            crate::services::history::HistoryEntryView,

            // Error types
            crate::errors::ErrorResponse
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDocV1;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
