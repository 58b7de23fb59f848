//! Workflow topology administration over HTTP: stage and sub-stage CRUD,
//! adjacent-swap reordering, the deletion guards, and the picker queries
//! move dialogs are built on.

mod common;

use axum::http::Method;
use serde_json::{json, Value};

use common::{body_json, seed_order, seed_workflow, TestApp};

fn stage_names(topology: &Value) -> Vec<String> {
    topology
        .as_array()
        .expect("topology is an array")
        .iter()
        .map(|s| s["name"].as_str().unwrap().to_string())
        .collect()
}

fn sub_stage_names(topology: &Value, stage: &str) -> Vec<String> {
    topology
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["name"] == stage)
        .expect("stage present in topology")["sub_stages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap().to_string())
        .collect()
}

async fn topology(app: &TestApp) -> Value {
    let response = app
        .request_authenticated(Method::GET, "/api/v1/stages", None)
        .await;
    assert_eq!(response.status(), 200);
    body_json(response).await["data"].clone()
}

#[tokio::test]
async fn owner_builds_and_reshapes_the_topology() {
    let app = TestApp::new().await;

    // Stages append to the end of the workflow when no order is pinned.
    let mut ids = Vec::new();
    for name in ["Cutting", "Sewing", "Packing"] {
        let response = app
            .request_authenticated(
                Method::POST,
                "/api/v1/stages",
                Some(json!({ "name": name })),
            )
            .await;
        assert_eq!(response.status(), 201);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        ids.push(body["data"]["id"].as_str().unwrap().to_string());
    }

    let listed = topology(&app).await;
    assert_eq!(stage_names(&listed), vec!["Cutting", "Sewing", "Packing"]);
    let orders: Vec<i64> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["sequence_order"].as_i64().unwrap())
        .collect();
    assert_eq!(orders, vec![1, 2, 3]);

    // Renaming leaves the ordering alone.
    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/stages/{}", ids[1]),
            Some(json!({ "name": "Stitching", "location": "Floor 2" })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = body_json(response).await;
    assert_eq!(body["data"]["name"], "Stitching");
    assert_eq!(body["data"]["location"], "Floor 2");

    // Reordering is an adjacent swap; the response carries the new walk.
    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/stages/{}/move-down", ids[0]),
            None,
        )
        .await;
    assert_eq!(response.status(), 200);
    let swapped = body_json(response).await["data"].clone();
    assert_eq!(stage_names(&swapped), vec!["Stitching", "Cutting", "Packing"]);

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/stages/{}/move-up", ids[0]),
            None,
        )
        .await;
    assert_eq!(response.status(), 200);
    let restored = body_json(response).await["data"].clone();
    assert_eq!(stage_names(&restored), vec!["Cutting", "Stitching", "Packing"]);
}

#[tokio::test]
async fn reordering_stops_at_the_workflow_edges() {
    let app = TestApp::new().await;
    let flow = seed_workflow(&app).await;

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/stages/{}/move-up", flow.cutting),
            None,
        )
        .await;
    assert_eq!(response.status(), 400);
    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("already first"));

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/stages/{}/move-down", flow.completed),
            None,
        )
        .await;
    assert_eq!(response.status(), 400);

    // The same edge rules apply within a stage's sub-stages.
    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/sub-stages/{}/move-up", flow.wash),
            None,
        )
        .await;
    assert_eq!(response.status(), 400);

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/sub-stages/{}/move-down", flow.iron),
            None,
        )
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn sub_stage_reordering_swaps_siblings() {
    let app = TestApp::new().await;
    let flow = seed_workflow(&app).await;

    let listed = topology(&app).await;
    assert_eq!(sub_stage_names(&listed, "Finishing"), vec!["Wash", "Iron"]);

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/sub-stages/{}/move-up", flow.iron),
            None,
        )
        .await;
    assert_eq!(response.status(), 200);
    let swapped = body_json(response).await["data"].clone();
    assert_eq!(sub_stage_names(&swapped, "Finishing"), vec!["Iron", "Wash"]);
}

#[tokio::test]
async fn stages_holding_allocations_cannot_be_deleted() {
    let app = TestApp::new().await;
    let flow = seed_workflow(&app).await;
    let (_, items) = seed_order(&app, "EXP-2001", &[("TEE-M", 10)]).await;
    let item = items[0];

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/movements/allocate",
            Some(json!({ "items": [{ "id": item, "quantity": 10 }] })),
        )
        .await;
    assert_eq!(response.status(), 200);

    // Quantity sits in Cutting: deletion is refused.
    let response = app
        .request_authenticated(
            Method::DELETE,
            &format!("/api/v1/stages/{}", flow.cutting),
            None,
        )
        .await;
    assert_eq!(response.status(), 409);
    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("still holds"));

    // Once the quantity moves on, the stage can go.
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/movements/forward",
            Some(json!({ "items": [{ "id": item, "quantity": 10 }] })),
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = app
        .request_authenticated(
            Method::DELETE,
            &format!("/api/v1/stages/{}", flow.cutting),
            None,
        )
        .await;
    assert_eq!(response.status(), 200);

    let listed = topology(&app).await;
    assert_eq!(stage_names(&listed), vec!["Finishing", "Completed"]);
}

#[tokio::test]
async fn occupied_sub_stages_cannot_be_deleted() {
    let app = TestApp::new().await;
    let flow = seed_workflow(&app).await;
    let (_, items) = seed_order(&app, "EXP-2002", &[("TEE-L", 10)]).await;
    let item = items[0];

    app.request_authenticated(
        Method::POST,
        "/api/v1/movements/allocate",
        Some(json!({ "items": [{ "id": item, "quantity": 10 }] })),
    )
    .await;
    app.request_authenticated(
        Method::POST,
        "/api/v1/movements/forward",
        Some(json!({ "items": [{ "id": item, "quantity": 10 }] })),
    )
    .await;

    // Wash holds the quantity now; Iron is empty.
    let response = app
        .request_authenticated(
            Method::DELETE,
            &format!("/api/v1/sub-stages/{}", flow.wash),
            None,
        )
        .await;
    assert_eq!(response.status(), 409);

    let response = app
        .request_authenticated(
            Method::DELETE,
            &format!("/api/v1/sub-stages/{}", flow.iron),
            None,
        )
        .await;
    assert_eq!(response.status(), 200);

    let listed = topology(&app).await;
    assert_eq!(sub_stage_names(&listed, "Finishing"), vec!["Wash"]);
}

#[tokio::test]
async fn directly_occupied_stages_cannot_gain_sub_stages() {
    let app = TestApp::new().await;
    let flow = seed_workflow(&app).await;
    let (_, items) = seed_order(&app, "EXP-2003", &[("TEE-S", 10)]).await;
    let item = items[0];

    app.request_authenticated(
        Method::POST,
        "/api/v1/movements/allocate",
        Some(json!({ "items": [{ "id": item, "quantity": 10 }] })),
    )
    .await;

    // Cutting holds direct allocations, so subdividing it would strand them.
    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/stages/{}/sub-stages", flow.cutting),
            Some(json!({ "name": "Rough cut" })),
        )
        .await;
    assert_eq!(response.status(), 409);
    let body = body_json(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("placed directly on it"));

    // The empty Completed stage takes sub-stages freely.
    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/stages/{}/sub-stages", flow.completed),
            Some(json!({ "name": "Boxed" })),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body = body_json(response).await;
    assert_eq!(body["data"]["name"], "Boxed");
    assert_eq!(body["data"]["stage_id"], flow.completed.to_string());
}

#[tokio::test]
async fn pickers_walk_the_flattened_order() {
    let app = TestApp::new().await;
    let flow = seed_workflow(&app).await;

    // Next from Cutting descends into Finishing's first sub-stage.
    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/stages/next?stage_id={}", flow.cutting),
            None,
        )
        .await;
    assert_eq!(response.status(), 200);
    let next = body_json(response).await["data"].clone();
    assert_eq!(next["stage_name"], "Finishing");
    assert_eq!(next["sub_stage_name"], "Wash");
    assert_eq!(next["is_sub_stage"], true);

    // From Wash the walk stays inside Finishing.
    let response = app
        .request_authenticated(
            Method::GET,
            &format!(
                "/api/v1/stages/next?stage_id={}&sub_stage_id={}",
                flow.finishing, flow.wash
            ),
            None,
        )
        .await;
    let next = body_json(response).await["data"].clone();
    assert_eq!(next["sub_stage_name"], "Iron");

    // The terminal position has no successor.
    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/stages/next?stage_id={}", flow.completed),
            None,
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = body_json(response).await;
    assert!(body["data"].is_null());

    // Subsequent lists the whole remaining walk in order.
    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/stages/subsequent?stage_id={}", flow.cutting),
            None,
        )
        .await;
    let after = body_json(response).await["data"].clone();
    let labels: Vec<(String, Option<String>)> = after
        .as_array()
        .unwrap()
        .iter()
        .map(|f| {
            (
                f["stage_name"].as_str().unwrap().to_string(),
                f["sub_stage_name"].as_str().map(str::to_string),
            )
        })
        .collect();
    assert_eq!(
        labels,
        vec![
            ("Finishing".to_string(), Some("Wash".to_string())),
            ("Finishing".to_string(), Some("Iron".to_string())),
            ("Completed".to_string(), None),
        ]
    );

    // An unknown stage id is a clean 404, not an empty list.
    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/stages/next?stage_id={}", uuid::Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn workers_read_but_cannot_reshape_the_topology() {
    let app = TestApp::new().await;
    let flow = seed_workflow(&app).await;

    // Reading the topology is part of moving items, so workers may.
    let response = app
        .request(Method::GET, "/api/v1/stages", None, Some(app.worker_token()))
        .await;
    assert_eq!(response.status(), 200);

    // Every mutation is owner-only.
    let worker = app.worker_token();
    let attempts = [
        (Method::POST, "/api/v1/stages".to_string(), Some(json!({ "name": "Dyeing" }))),
        (
            Method::PUT,
            format!("/api/v1/stages/{}", flow.cutting),
            Some(json!({ "name": "Renamed" })),
        ),
        (Method::DELETE, format!("/api/v1/stages/{}", flow.completed), None),
        (
            Method::POST,
            format!("/api/v1/stages/{}/move-down", flow.cutting),
            None,
        ),
        (
            Method::POST,
            format!("/api/v1/stages/{}/sub-stages", flow.completed),
            Some(json!({ "name": "Boxed" })),
        ),
        (
            Method::DELETE,
            format!("/api/v1/sub-stages/{}", flow.iron),
            None,
        ),
    ];
    for (method, uri, body) in attempts {
        let response = app.request(method.clone(), &uri, body, Some(worker)).await;
        assert_eq!(response.status(), 403, "{} {} must be owner-only", method, uri);
    }

    // Nothing changed.
    let listed = topology(&app).await;
    assert_eq!(stage_names(&listed), vec!["Cutting", "Finishing", "Completed"]);
    assert_eq!(sub_stage_names(&listed, "Finishing"), vec!["Wash", "Iron"]);
}

#[tokio::test]
async fn topologies_are_scoped_per_organization() {
    let app = TestApp::new().await;
    seed_workflow(&app).await;

    let foreign_token = app
        .state
        .auth
        .issue_token(
            uuid::Uuid::new_v4(),
            uuid::Uuid::new_v4(),
            stageline_api::auth::StaffRole::Owner,
        )
        .expect("issue foreign token");

    let response = app
        .request(Method::GET, "/api/v1/stages", None, Some(&foreign_token))
        .await;
    assert_eq!(response.status(), 200);
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn stage_admin_requires_a_token() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/api/v1/stages", None, None).await;
    assert_eq!(response.status(), 401);

    let response = app
        .request(
            Method::POST,
            "/api/v1/stages",
            Some(json!({ "name": "Cutting" })),
            None,
        )
        .await;
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn stage_names_are_length_checked() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(Method::POST, "/api/v1/stages", Some(json!({ "name": "" })))
        .await;
    assert_eq!(response.status(), 400);

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/stages",
            Some(json!({ "name": "x".repeat(101) })),
        )
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn pinned_sequence_orders_are_honored() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/stages",
            Some(json!({ "name": "Packing", "sequence_order": 5 })),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body = body_json(response).await;
    assert_eq!(body["data"]["sequence_order"], 5);

    // The next unpinned stage appends after the pinned one.
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/stages",
            Some(json!({ "name": "Shipping" })),
        )
        .await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["sequence_order"], 6);
}
