//! Stageline API Library
//!
//! Tracks garment export orders through a configurable production workflow.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod metrics;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;
pub mod workflow;

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub auth: Arc<auth::AuthService>,
    pub services: handlers::AppServices,
}

// Common query parameters for list endpoints
#[derive(Debug, Deserialize, ToSchema)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, query: &ListQuery) -> Self {
        let limit = query.limit.max(1);
        Self {
            items,
            total,
            page: query.page,
            limit,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn validation_errors(errors: Vec<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some("Validation failed".to_string()),
            errors: Some(errors),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Every versioned route. The movement and topology routes sit behind the
/// staff JWT check; `/status` stays open for load balancers.
pub fn api_v1_routes(auth_service: Arc<auth::AuthService>) -> Router<AppState> {
    Router::new()
        // Workflow topology
        .route(
            "/stages",
            get(handlers::stages::list_stages).post(handlers::stages::create_stage),
        )
        .route("/stages/next", get(handlers::stages::next_position))
        .route(
            "/stages/subsequent",
            get(handlers::stages::subsequent_positions),
        )
        .route(
            "/stages/:id",
            put(handlers::stages::update_stage).delete(handlers::stages::delete_stage),
        )
        .route("/stages/:id/move-up", post(handlers::stages::move_stage_up))
        .route(
            "/stages/:id/move-down",
            post(handlers::stages::move_stage_down),
        )
        .route(
            "/stages/:id/sub-stages",
            post(handlers::stages::create_sub_stage),
        )
        .route(
            "/sub-stages/:id",
            put(handlers::stages::update_sub_stage).delete(handlers::stages::delete_sub_stage),
        )
        .route(
            "/sub-stages/:id/move-up",
            post(handlers::stages::move_sub_stage_up),
        )
        .route(
            "/sub-stages/:id/move-down",
            post(handlers::stages::move_sub_stage_down),
        )
        // Movements
        .route("/movements/allocate", post(handlers::movements::allocate))
        .route("/movements/forward", post(handlers::movements::move_forward))
        .route("/movements/rework", post(handlers::movements::rework))
        .route("/movements/history", get(handlers::movements::org_history))
        // Orders and items
        .route(
            "/orders",
            get(handlers::orders::list_orders).post(handlers::orders::create_order),
        )
        .route("/orders/:id", get(handlers::orders::get_order))
        .route("/items/:id", get(handlers::orders::get_item))
        .route("/items/:id/history", get(handlers::history::item_history))
        .route_layer(middleware::from_fn_with_state(
            auth_service,
            auth::authenticate,
        ))
        // Open endpoints, added after the auth layer so it does not cover them
        .route("/status", get(api_status))
}

/// The full application router: versioned API, health and metrics
/// endpoints, Swagger UI, HTTP tracing and request ids.
pub fn app_router(state: AppState) -> Router {
    let auth_service = state.auth.clone();
    Router::new()
        .route("/", get(|| async { "stageline-api up" }))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_endpoint))
        .route("/metrics/json", get(metrics_json_endpoint))
        .nest("/api/v1", api_v1_routes(auth_service))
        .merge(openapi::swagger_ui())
        .layer(crate::tracing::configure_http_tracing())
        .layer(middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
        .with_state(state)
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let version = env!("CARGO_PKG_VERSION");
    let status_data = json!({
        "status": "ok",
        "service": "stageline-api",
        "version": version,
        "timestamp": Utc::now().to_rfc3339(),
    });
    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "database": db_status,
        "timestamp": Utc::now().to_rfc3339(),
    });
    Ok(Json(ApiResponse::success(health_data)))
}

async fn metrics_endpoint() -> impl IntoResponse {
    match crate::metrics::metrics_handler().await {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            String::from("metrics error"),
        )
            .into_response(),
    }
}

async fn metrics_json_endpoint() -> impl IntoResponse {
    match crate::metrics::metrics_json_handler().await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "metrics error"})),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[tokio::test]
    async fn error_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-err"), async {
                ApiResponse::<()>::error("oops".into())
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-err"));
        assert!(!meta.timestamp.is_empty());
    }

    #[test]
    fn pagination_math_rounds_up() {
        let query = ListQuery { page: 2, limit: 20 };
        let paged = PaginatedResponse::new(vec![1, 2, 3], 41, &query);
        assert_eq!(paged.total_pages, 3);
        assert_eq!(paged.page, 2);
    }

    #[test]
    fn pagination_survives_a_zero_limit() {
        let query = ListQuery { page: 1, limit: 0 };
        let paged = PaginatedResponse::new(Vec::<i32>::new(), 10, &query);
        assert_eq!(paged.limit, 1);
        assert_eq!(paged.total_pages, 10);
    }
}
