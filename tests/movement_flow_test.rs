//! End-to-end movement flows over HTTP: allocation from the new pool,
//! forward moves with and without explicit targets, rework, batch
//! partial-success reporting, and the ledger invariants visible through the
//! item detail endpoint.

mod common;

use axum::http::Method;
use serde_json::{json, Value};
use uuid::Uuid;

use common::{body_json, seed_order, seed_workflow, TestApp};

/// Pull the allocation rows out of an item detail body, keyed for easy
/// lookup: (stage_id, sub_stage_id) -> quantity.
fn allocation_map(detail: &Value) -> Vec<(String, Option<String>, i64)> {
    detail["allocations"]
        .as_array()
        .expect("item detail carries an allocations array")
        .iter()
        .map(|row| {
            (
                row["stage_id"].as_str().unwrap().to_string(),
                row["sub_stage_id"].as_str().map(str::to_string),
                row["quantity"].as_i64().unwrap(),
            )
        })
        .collect()
}

fn quantity_at(detail: &Value, stage: Uuid, sub: Option<Uuid>) -> Option<i64> {
    let stage = stage.to_string();
    let sub = sub.map(|s| s.to_string());
    allocation_map(detail)
        .into_iter()
        .find(|(s, ss, _)| *s == stage && *ss == sub)
        .map(|(_, _, qty)| qty)
}

/// new_pool plus the allocated rows must always equal the item quantity.
fn assert_conserved(detail: &Value, total: i64) {
    let allocated: i64 = allocation_map(detail).iter().map(|(_, _, qty)| qty).sum();
    let pool = detail["new_pool"].as_i64().unwrap();
    assert_eq!(
        pool + allocated,
        total,
        "ledger out of balance: pool {} + allocated {} != {}",
        pool,
        allocated,
        total
    );
    for (_, _, qty) in allocation_map(detail) {
        assert!(qty > 0, "allocation rows must hold positive quantity");
    }
}

async fn item_detail(app: &TestApp, item: Uuid) -> Value {
    let response = app
        .request_authenticated(Method::GET, &format!("/api/v1/items/{}", item), None)
        .await;
    assert_eq!(response.status(), 200);
    body_json(response).await["data"].clone()
}

#[tokio::test]
async fn item_moves_through_the_full_workflow() {
    let app = TestApp::new().await;
    let flow = seed_workflow(&app).await;
    let (_, items) = seed_order(&app, "EXP-1001", &[("TSHIRT-M", 10)]).await;
    let item = items[0];

    // Allocation without a target lands on the first position (Cutting).
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/movements/allocate",
            Some(json!({ "items": [{ "id": item, "quantity": 10 }] })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let report = body_json(response).await;
    assert_eq!(report["results"][0]["to_stage_id"], flow.cutting.to_string());
    assert!(report["results"][0]["to_sub_stage_id"].is_null());
    assert_eq!(report["errors"].as_array().unwrap().len(), 0);

    let detail = item_detail(&app, item).await;
    assert_eq!(detail["new_pool"], 0);
    assert_eq!(quantity_at(&detail, flow.cutting, None), Some(10));
    assert_conserved(&detail, 10);

    // Forward without a target advances one position: Cutting enters the
    // first sub-stage of Finishing.
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/movements/forward",
            Some(json!({ "items": [{ "id": item, "quantity": 10 }] })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let report = body_json(response).await;
    assert_eq!(
        report["results"][0]["to_stage_id"],
        flow.finishing.to_string()
    );
    assert_eq!(
        report["results"][0]["to_sub_stage_id"],
        flow.wash.to_string()
    );

    let detail = item_detail(&app, item).await;
    assert_eq!(quantity_at(&detail, flow.cutting, None), None);
    assert_eq!(
        quantity_at(&detail, flow.finishing, Some(flow.wash)),
        Some(10)
    );
    assert_conserved(&detail, 10);

    // A partial move to an explicit target splits the quantity: 4 to Iron,
    // 6 stay behind in Wash.
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/movements/forward",
            Some(json!({
                "items": [{ "id": item, "quantity": 4 }],
                "target_stage_id": flow.finishing,
                "target_sub_stage_id": flow.iron,
            })),
        )
        .await;
    assert_eq!(response.status(), 200);

    let detail = item_detail(&app, item).await;
    assert_eq!(
        quantity_at(&detail, flow.finishing, Some(flow.wash)),
        Some(6)
    );
    assert_eq!(
        quantity_at(&detail, flow.finishing, Some(flow.iron)),
        Some(4)
    );
    assert_conserved(&detail, 10);

    // Rework drains the Iron row back to Cutting with a mandatory reason.
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/movements/rework",
            Some(json!({
                "items": [{
                    "id": item,
                    "quantity": 4,
                    "source_stage_id": flow.finishing,
                    "source_sub_stage_id": flow.iron,
                }],
                "rework_reason": "QC failed",
                "target_rework_stage_id": flow.cutting,
            })),
        )
        .await;
    assert_eq!(response.status(), 200);

    let detail = item_detail(&app, item).await;
    assert_eq!(quantity_at(&detail, flow.cutting, None), Some(4));
    assert_eq!(
        quantity_at(&detail, flow.finishing, Some(flow.wash)),
        Some(6)
    );
    // The drained Iron row is gone, not zeroed.
    assert_eq!(quantity_at(&detail, flow.finishing, Some(flow.iron)), None);
    assert_eq!(allocation_map(&detail).len(), 2);
    assert_conserved(&detail, 10);

    // Four movements happened; the trail lists them newest first with the
    // derived direction on each entry.
    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/items/{}/history", item),
            None,
        )
        .await;
    assert_eq!(response.status(), 200);
    let history = body_json(response).await;
    let entries = history["data"]["items"].as_array().unwrap().clone();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0]["direction"], "rework");
    assert_eq!(entries[0]["rework_reason"], "QC failed");
    assert_eq!(entries[0]["from_sub_stage_name"], "Iron");
    assert_eq!(entries[0]["to_stage_name"], "Cutting");
    assert_eq!(entries[1]["direction"], "forward");
    assert_eq!(entries[2]["direction"], "forward");
    assert_eq!(entries[3]["direction"], "allocation");
    assert!(entries[3]["from_stage_id"].is_null());
}

#[tokio::test]
async fn allocation_is_capped_by_the_unallocated_pool() {
    let app = TestApp::new().await;
    let _flow = seed_workflow(&app).await;
    let (_, items) = seed_order(&app, "EXP-1002", &[("TSHIRT-L", 10)]).await;
    let item = items[0];

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/movements/allocate",
            Some(json!({ "items": [{ "id": item, "quantity": 7 }] })),
        )
        .await;
    assert_eq!(response.status(), 200);

    // Only 3 remain unallocated; asking for 5 fails and changes nothing.
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/movements/allocate",
            Some(json!({ "items": [{ "id": item, "quantity": 5 }] })),
        )
        .await;
    assert_eq!(response.status(), 500);
    let report = body_json(response).await;
    assert_eq!(report["results"].as_array().unwrap().len(), 0);
    let error = report["errors"][0]["error"].as_str().unwrap();
    assert!(error.contains("unallocated"), "got: {}", error);

    let detail = item_detail(&app, item).await;
    assert_eq!(detail["new_pool"], 3);
    assert_conserved(&detail, 10);
}

#[tokio::test]
async fn forward_cannot_target_an_earlier_position() {
    let app = TestApp::new().await;
    let flow = seed_workflow(&app).await;
    let (_, items) = seed_order(&app, "EXP-1003", &[("HOODIE-S", 10)]).await;
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

    // Everything sits in Wash now; Cutting is strictly earlier, so a
    // "forward" move there must be refused.
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/movements/forward",
            Some(json!({
                "items": [{ "id": item, "quantity": 10 }],
                "target_stage_id": flow.cutting,
            })),
        )
        .await;
    assert_eq!(response.status(), 500);
    let report = body_json(response).await;
    let error = report["errors"][0]["error"].as_str().unwrap();
    assert!(error.contains("strictly after"), "got: {}", error);

    let detail = item_detail(&app, item).await;
    assert_eq!(
        quantity_at(&detail, flow.finishing, Some(flow.wash)),
        Some(10)
    );
    assert_eq!(allocation_map(&detail).len(), 1);
}

#[tokio::test]
async fn oversized_forward_is_rejected_without_mutation() {
    let app = TestApp::new().await;
    let flow = seed_workflow(&app).await;
    let (_, items) = seed_order(&app, "EXP-1004", &[("HOODIE-M", 10)]).await;
    let item = items[0];

    app.request_authenticated(
        Method::POST,
        "/api/v1/movements/allocate",
        Some(json!({ "items": [{ "id": item, "quantity": 10 }] })),
    )
    .await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/movements/forward",
            Some(json!({ "items": [{ "id": item, "quantity": 15 }] })),
        )
        .await;
    assert_eq!(response.status(), 500);
    let report = body_json(response).await;
    let error = report["errors"][0]["error"].as_str().unwrap();
    assert!(error.contains("requested 15"), "got: {}", error);

    let detail = item_detail(&app, item).await;
    assert_eq!(quantity_at(&detail, flow.cutting, None), Some(10));

    // The refused move never reached the history either.
    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/items/{}/history", item),
            None,
        )
        .await;
    let history = body_json(response).await;
    assert_eq!(history["data"]["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn batch_reports_partial_success_with_207() {
    let app = TestApp::new().await;
    let flow = seed_workflow(&app).await;
    let (_, items) = seed_order(&app, "EXP-1005", &[("POLO-M", 10)]).await;
    let item = items[0];
    let unknown = Uuid::new_v4();

    app.request_authenticated(
        Method::POST,
        "/api/v1/movements/allocate",
        Some(json!({ "items": [{ "id": item, "quantity": 10 }] })),
    )
    .await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/movements/forward",
            Some(json!({
                "items": [
                    { "id": item, "quantity": 10 },
                    { "id": unknown, "quantity": 1 },
                ],
            })),
        )
        .await;
    assert_eq!(response.status(), 207);
    let report = body_json(response).await;
    assert_eq!(report["results"].as_array().unwrap().len(), 1);
    assert_eq!(report["results"][0]["item_id"], item.to_string());
    assert_eq!(report["errors"].as_array().unwrap().len(), 1);
    assert_eq!(report["errors"][0]["item_id"], unknown.to_string());
    assert!(report["errors"][0]["error"]
        .as_str()
        .unwrap()
        .contains("not found"));

    // The valid item's move persisted despite its batch-mate failing.
    let detail = item_detail(&app, item).await;
    assert_eq!(
        quantity_at(&detail, flow.finishing, Some(flow.wash)),
        Some(10)
    );
}

#[tokio::test]
async fn rework_reason_is_mandatory_and_length_checked() {
    let app = TestApp::new().await;
    let flow = seed_workflow(&app).await;
    let (_, items) = seed_order(&app, "EXP-1006", &[("POLO-L", 10)]).await;
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

    // Two characters is below the 3-255 window: the whole request is
    // refused before any item is attempted.
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/movements/rework",
            Some(json!({
                "items": [{
                    "id": item,
                    "quantity": 10,
                    "source_stage_id": flow.finishing,
                    "source_sub_stage_id": flow.wash,
                }],
                "rework_reason": "no",
                "target_rework_stage_id": flow.cutting,
            })),
        )
        .await;
    assert_eq!(response.status(), 400);

    let detail = item_detail(&app, item).await;
    assert_eq!(
        quantity_at(&detail, flow.finishing, Some(flow.wash)),
        Some(10)
    );
}

#[tokio::test]
async fn rework_target_must_sit_strictly_before_the_source() {
    let app = TestApp::new().await;
    let flow = seed_workflow(&app).await;
    let (_, items) = seed_order(&app, "EXP-1007", &[("JACKET-M", 10)]).await;
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

    // "Rework" forward to Completed is refused.
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/movements/rework",
            Some(json!({
                "items": [{
                    "id": item,
                    "quantity": 10,
                    "source_stage_id": flow.finishing,
                    "source_sub_stage_id": flow.wash,
                }],
                "rework_reason": "stitching came loose",
                "target_rework_stage_id": flow.completed,
            })),
        )
        .await;
    assert_eq!(response.status(), 500);
    let report = body_json(response).await;
    assert!(report["errors"][0]["error"]
        .as_str()
        .unwrap()
        .contains("strictly before"));

    // So is a rework that goes nowhere (same position as the source).
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/movements/rework",
            Some(json!({
                "items": [{
                    "id": item,
                    "quantity": 10,
                    "source_stage_id": flow.finishing,
                    "source_sub_stage_id": flow.wash,
                }],
                "rework_reason": "stitching came loose",
                "target_rework_stage_id": flow.finishing,
                "target_rework_sub_stage_id": flow.wash,
            })),
        )
        .await;
    assert_eq!(response.status(), 500);
}

#[tokio::test]
async fn rework_source_position_must_be_exact() {
    let app = TestApp::new().await;
    let flow = seed_workflow(&app).await;
    let (_, items) = seed_order(&app, "EXP-1008", &[("JACKET-L", 10)]).await;
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

    // Finishing tracks sub-stages, so a rework source naming only the stage
    // is ambiguous and refused; nothing defaults here.
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/movements/rework",
            Some(json!({
                "items": [{
                    "id": item,
                    "quantity": 10,
                    "source_stage_id": flow.finishing,
                }],
                "rework_reason": "dye mismatch",
                "target_rework_stage_id": flow.cutting,
            })),
        )
        .await;
    assert_eq!(response.status(), 500);
    let report = body_json(response).await;
    assert!(report["errors"][0]["error"]
        .as_str()
        .unwrap()
        .contains("must name one"));

    // A position the item holds nothing at is a clean per-item failure too.
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/movements/rework",
            Some(json!({
                "items": [{
                    "id": item,
                    "quantity": 10,
                    "source_stage_id": flow.finishing,
                    "source_sub_stage_id": flow.iron,
                }],
                "rework_reason": "dye mismatch",
                "target_rework_stage_id": flow.cutting,
            })),
        )
        .await;
    assert_eq!(response.status(), 500);
    let report = body_json(response).await;
    assert!(report["errors"][0]["error"]
        .as_str()
        .unwrap()
        .contains("no allocation at the stated source"));
}

#[tokio::test]
async fn non_positive_quantities_are_refused_up_front() {
    let app = TestApp::new().await;
    let _flow = seed_workflow(&app).await;
    let (_, items) = seed_order(&app, "EXP-1009", &[("SCARF-U", 10)]).await;
    let item = items[0];

    for quantity in [0, -3] {
        let response = app
            .request_authenticated(
                Method::POST,
                "/api/v1/movements/forward",
                Some(json!({ "items": [{ "id": item, "quantity": quantity }] })),
            )
            .await;
        assert_eq!(response.status(), 400, "quantity {} must be a 400", quantity);
    }

    // An empty batch is malformed as well.
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/movements/forward",
            Some(json!({ "items": [] })),
        )
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn explicit_target_prefers_the_stated_source_stage() {
    let app = TestApp::new().await;
    let flow = seed_workflow(&app).await;
    let (_, items) = seed_order(&app, "EXP-1010", &[("DRESS-M", 10)]).await;
    let item = items[0];

    // Spread the item: 6 in Cutting, 4 in Wash.
    app.request_authenticated(
        Method::POST,
        "/api/v1/movements/allocate",
        Some(json!({ "items": [{ "id": item, "quantity": 10 }] })),
    )
    .await;
    app.request_authenticated(
        Method::POST,
        "/api/v1/movements/forward",
        Some(json!({
            "items": [{ "id": item, "quantity": 4 }],
            "target_stage_id": flow.finishing,
            "target_sub_stage_id": flow.wash,
        })),
    )
    .await;

    // Both rows sit before Iron and both cover 2; the caller's preference
    // wins over the earliest-position default.
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/movements/forward",
            Some(json!({
                "items": [{ "id": item, "quantity": 2 }],
                "target_stage_id": flow.finishing,
                "target_sub_stage_id": flow.iron,
                "source_stage_id": flow.finishing,
            })),
        )
        .await;
    assert_eq!(response.status(), 200);

    let detail = item_detail(&app, item).await;
    assert_eq!(quantity_at(&detail, flow.cutting, None), Some(6));
    assert_eq!(
        quantity_at(&detail, flow.finishing, Some(flow.wash)),
        Some(2)
    );
    assert_eq!(
        quantity_at(&detail, flow.finishing, Some(flow.iron)),
        Some(2)
    );
    assert_conserved(&detail, 10);

    // Without the preference the earliest eligible row (Cutting) drains.
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/movements/forward",
            Some(json!({
                "items": [{ "id": item, "quantity": 2 }],
                "target_stage_id": flow.finishing,
                "target_sub_stage_id": flow.iron,
            })),
        )
        .await;
    assert_eq!(response.status(), 200);

    let detail = item_detail(&app, item).await;
    assert_eq!(quantity_at(&detail, flow.cutting, None), Some(4));
    assert_eq!(
        quantity_at(&detail, flow.finishing, Some(flow.iron)),
        Some(4)
    );
}

#[tokio::test]
async fn split_quantities_merge_back_into_one_row() {
    let app = TestApp::new().await;
    let flow = seed_workflow(&app).await;
    let (_, items) = seed_order(&app, "EXP-1011", &[("SKIRT-S", 10)]).await;
    let item = items[0];

    // Two separate allocations of the same position stay one row.
    for quantity in [6, 4] {
        let response = app
            .request_authenticated(
                Method::POST,
                "/api/v1/movements/allocate",
                Some(json!({ "items": [{ "id": item, "quantity": quantity }] })),
            )
            .await;
        assert_eq!(response.status(), 200);
    }

    let detail = item_detail(&app, item).await;
    assert_eq!(allocation_map(&detail).len(), 1);
    assert_eq!(quantity_at(&detail, flow.cutting, None), Some(10));
    assert_conserved(&detail, 10);
}

#[tokio::test]
async fn item_completes_at_the_final_position() {
    let app = TestApp::new().await;
    let flow = seed_workflow(&app).await;
    let (_, items) = seed_order(&app, "EXP-1012", &[("COAT-M", 5)]).await;
    let item = items[0];

    app.request_authenticated(
        Method::POST,
        "/api/v1/movements/allocate",
        Some(json!({ "items": [{ "id": item, "quantity": 5 }] })),
    )
    .await;

    // Walk the latest allocation forward until the terminal stage.
    for _ in 0..3 {
        let detail = item_detail(&app, item).await;
        assert_eq!(detail["completed"], false);
        let response = app
            .request_authenticated(
                Method::POST,
                "/api/v1/movements/forward",
                Some(json!({ "items": [{ "id": item, "quantity": 5 }] })),
            )
            .await;
        assert_eq!(response.status(), 200);
    }

    let detail = item_detail(&app, item).await;
    assert_eq!(quantity_at(&detail, flow.completed, None), Some(5));
    assert_eq!(detail["completed"], true);

    // The walk is over; another forward has nowhere to go.
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/movements/forward",
            Some(json!({ "items": [{ "id": item, "quantity": 5 }] })),
        )
        .await;
    assert_eq!(response.status(), 500);
    let report = body_json(response).await;
    assert!(report["errors"][0]["error"]
        .as_str()
        .unwrap()
        .contains("final workflow position"));
}

#[tokio::test]
async fn workers_move_items_but_cannot_reach_other_organizations() {
    let app = TestApp::new().await;
    let flow = seed_workflow(&app).await;
    let (_, items) = seed_order(&app, "EXP-1013", &[("VEST-M", 10)]).await;
    let item = items[0];

    // Workers hold the move capability.
    let response = app
        .request(
            Method::POST,
            "/api/v1/movements/allocate",
            Some(json!({ "items": [{ "id": item, "quantity": 10 }] })),
            Some(app.worker_token()),
        )
        .await;
    assert_eq!(response.status(), 200);
    let detail = item_detail(&app, item).await;
    assert_eq!(quantity_at(&detail, flow.cutting, None), Some(10));

    // A token from a different organization sees nothing of this item.
    let foreign_token = app
        .state
        .auth
        .issue_token(
            Uuid::new_v4(),
            Uuid::new_v4(),
            stageline_api::auth::StaffRole::Owner,
        )
        .expect("issue foreign token");
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/items/{}", item),
            None,
            Some(&foreign_token),
        )
        .await;
    assert_eq!(response.status(), 404);

    let response = app
        .request(
            Method::POST,
            "/api/v1/movements/forward",
            Some(json!({ "items": [{ "id": item, "quantity": 10 }] })),
            Some(&foreign_token),
        )
        .await;
    assert_eq!(response.status(), 500);
    let report = body_json(response).await;
    assert!(report["errors"][0]["error"]
        .as_str()
        .unwrap()
        .contains("not found"));
}

#[tokio::test]
async fn movements_require_a_token() {
    let app = TestApp::new().await;
    let response = app
        .request(
            Method::POST,
            "/api/v1/movements/forward",
            Some(json!({ "items": [{ "id": Uuid::new_v4(), "quantity": 1 }] })),
            None,
        )
        .await;
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn organization_history_lists_every_movement_newest_first() {
    let app = TestApp::new().await;
    let _flow = seed_workflow(&app).await;
    let (_, items) = seed_order(&app, "EXP-1014", &[("CAP-U", 4), ("BELT-U", 6)]).await;

    for item in &items {
        let response = app
            .request_authenticated(
                Method::POST,
                "/api/v1/movements/allocate",
                Some(json!({ "items": [{ "id": item, "quantity": 2 }] })),
            )
            .await;
        assert_eq!(response.status(), 200);
    }

    let response = app
        .request_authenticated(Method::GET, "/api/v1/movements/history?limit=1", None)
        .await;
    assert_eq!(response.status(), 200);
    let page = body_json(response).await;
    assert_eq!(page["data"]["total"], 2);
    assert_eq!(page["data"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(page["data"]["total_pages"], 2);
    // Newest first: the second item's allocation leads the page.
    assert_eq!(page["data"]["items"][0]["item_id"], items[1].to_string());
}
