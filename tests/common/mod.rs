use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use serde_json::Value;
use stageline_api::{
    auth::{AuthService, StaffContext, StaffRole},
    config::{AppConfig, DEV_DEFAULT_JWT_SECRET},
    db,
    events::{self, EventSender},
    handlers::AppServices,
    AppState,
};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

/// Helper harness for spinning up the full application against a throwaway
/// SQLite database. Each instance gets its own database file, organization,
/// and staff tokens, so tests can run in parallel without sharing state.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub organization_id: Uuid,
    owner_id: Uuid,
    owner_token: String,
    worker_token: String,
    #[allow(dead_code)]
    auth_service: Arc<AuthService>,
    _event_task: tokio::task::JoinHandle<()>,
    _db_dir: TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_dir = TempDir::new().expect("create temp dir for test database");
        let db_path = db_dir.path().join("stageline_test.db");
        let database_url = format!("sqlite://{}?mode=rwc", db_path.display());

        let mut cfg = AppConfig::new(
            database_url,
            DEV_DEFAULT_JWT_SECRET.to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "development".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth_service = Arc::new(AuthService::new(cfg.auth_config()));
        let services = AppServices::new(db_arc.clone(), Some(Arc::new(event_sender)));

        let state = AppState {
            db: db_arc,
            config: cfg,
            auth: auth_service.clone(),
            services,
        };
        let router = stageline_api::app_router(state.clone());

        let organization_id = Uuid::new_v4();
        let owner_id = Uuid::new_v4();
        let owner_token = auth_service
            .issue_token(owner_id, organization_id, StaffRole::Owner)
            .expect("issue owner token");
        let worker_token = auth_service
            .issue_token(Uuid::new_v4(), organization_id, StaffRole::Worker)
            .expect("issue worker token");

        Self {
            router,
            state,
            organization_id,
            owner_id,
            owner_token,
            worker_token,
            auth_service,
            _event_task: event_task,
            _db_dir: db_dir,
        }
    }

    /// Bearer token for an owner of the test organization.
    pub fn token(&self) -> &str {
        &self.owner_token
    }

    /// Bearer token for a worker in the same organization.
    #[allow(dead_code)]
    pub fn worker_token(&self) -> &str {
        &self.worker_token
    }

    /// Staff context matching the owner token, for seeding through services.
    pub fn owner_ctx(&self) -> StaffContext {
        StaffContext {
            staff_id: self.owner_id,
            organization_id: self.organization_id,
            role: StaffRole::Owner,
        }
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for authenticated JSON requests as the owner.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request(method, uri, body, Some(self.token())).await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

/// Read a response body to completion and parse it as JSON.
pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body is not valid json")
    }
}

/// Identifiers for the three-stage fixture used across the movement tests.
///
/// Cutting (1) -> Finishing (2) { Wash (2.1), Iron (2.2) } -> Completed (3)
#[allow(dead_code)]
pub struct WorkflowFixture {
    pub cutting: Uuid,
    pub finishing: Uuid,
    pub wash: Uuid,
    pub iron: Uuid,
    pub completed: Uuid,
}

/// Seed the standard workflow through the stage service.
#[allow(dead_code)]
pub async fn seed_workflow(app: &TestApp) -> WorkflowFixture {
    use stageline_api::services::stages::{CreateStageRequest, CreateSubStageRequest};

    let ctx = app.owner_ctx();
    let stages = &app.state.services.stages;

    let cutting = stages
        .create_stage(
            &ctx,
            CreateStageRequest {
                name: "Cutting".to_string(),
                sequence_order: None,
                location: Some("Floor 1".to_string()),
            },
        )
        .await
        .expect("seed cutting stage");
    let finishing = stages
        .create_stage(
            &ctx,
            CreateStageRequest {
                name: "Finishing".to_string(),
                sequence_order: None,
                location: None,
            },
        )
        .await
        .expect("seed finishing stage");
    let wash = stages
        .create_sub_stage(
            &ctx,
            finishing.id,
            CreateSubStageRequest {
                name: "Wash".to_string(),
                sequence_order: None,
                location: None,
            },
        )
        .await
        .expect("seed wash sub-stage");
    let iron = stages
        .create_sub_stage(
            &ctx,
            finishing.id,
            CreateSubStageRequest {
                name: "Iron".to_string(),
                sequence_order: None,
                location: None,
            },
        )
        .await
        .expect("seed iron sub-stage");
    let completed = stages
        .create_stage(
            &ctx,
            CreateStageRequest {
                name: "Completed".to_string(),
                sequence_order: None,
                location: None,
            },
        )
        .await
        .expect("seed completed stage");

    WorkflowFixture {
        cutting: cutting.id,
        finishing: finishing.id,
        wash: wash.id,
        iron: iron.id,
        completed: completed.id,
    }
}

/// Seed an order with the given item lines and return (order id, item ids in
/// the order they were given).
#[allow(dead_code)]
pub async fn seed_order(
    app: &TestApp,
    order_number: &str,
    items: &[(&str, i32)],
) -> (Uuid, Vec<Uuid>) {
    use stageline_api::services::orders::{CreateOrderItemRequest, CreateOrderRequest};

    let detail = app
        .state
        .services
        .orders
        .create_order(
            &app.owner_ctx(),
            CreateOrderRequest {
                order_number: order_number.to_string(),
                buyer_name: Some("Acme Imports".to_string()),
                notes: None,
                items: items
                    .iter()
                    .map(|(sku, quantity)| CreateOrderItemRequest {
                        sku: sku.to_string(),
                        name: format!("Line {}", sku),
                        total_quantity: *quantity,
                        attributes: None,
                    })
                    .collect(),
            },
        )
        .await
        .expect("seed order");

    let item_ids = detail.items.iter().map(|line| line.id).collect();
    (detail.id, item_ids)
}
