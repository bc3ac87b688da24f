//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use api::config::Config;
use api::routes::orders::AppState;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::ProductId;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use storage::{InMemoryStore, InventoryStore};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

async fn setup_with_config(
    config: Config,
) -> (axum::Router, Arc<AppState<InMemoryStore>>, InMemoryStore) {
    let store = InMemoryStore::new();
    api::seed_default_tiers(&store).await.unwrap();
    store
        .set_stock(&ProductId::new("SKU-MUG"), 10)
        .await
        .unwrap();
    store
        .set_stock(&ProductId::new("SKU-TEA"), 10)
        .await
        .unwrap();

    let state = api::create_default_state(store.clone(), &config);
    let app = api::create_app(state.clone(), get_metrics_handle());
    (app, state, store)
}

async fn setup() -> (axum::Router, Arc<AppState<InMemoryStore>>, InMemoryStore) {
    setup_with_config(Config::default()).await
}

/// Two mugs and a tea: subtotal 48.50, tax 4.00, shipping 6.00, total 58.50.
fn checkout_body(account_id: Option<&str>) -> Value {
    json!({
        "account_id": account_id,
        "customer": { "name": "Ana Lima", "email": "ana@example.com", "phone": "+64 21 555 0101" },
        "shipping_address": {
            "line1": "12 Harbour Road",
            "city": "Wellington",
            "postal_code": "6011",
            "country": "NZ"
        },
        "items": [
            { "product_id": "SKU-MUG", "quantity": 2, "unit_price": 1800, "name": "Enamel Mug" },
            { "product_id": "SKU-TEA", "quantity": 1, "unit_price": 1250, "name": "Loose Leaf Tea" }
        ],
        "totals": { "subtotal": 4850, "tax": 400, "shipping": 600, "discount": 0, "total": 5850 },
        "marketing_opt_in": true,
        "payment": { "provider": "stripe", "transaction_id": "pi_3Nabc" }
    })
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn place_order(app: &axum::Router, account_id: Option<&str>) -> String {
    let (status, json) = send(app, post_json("/checkout", &checkout_body(account_id))).await;
    assert_eq!(status, StatusCode::CREATED, "checkout failed: {json}");
    json["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _, _) = setup().await;

    let (status, json) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["storage"], "up");
}

#[tokio::test]
async fn test_checkout_commits_order() {
    let (app, _, store) = setup().await;

    let (status, json) = send(&app, post_json("/checkout", &checkout_body(None))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["status"], "processing");
    assert_eq!(json["channel"], "online");
    assert_eq!(json["payment_status"], "paid");
    assert_eq!(json["totals"]["total"], 5850);
    assert_eq!(json["billing_address"]["city"], "Wellington");

    assert_eq!(store.order_count().await, 1);
    assert_eq!(store.order_item_count().await, 2);
    let mugs = store.get_stock(&ProductId::new("SKU-MUG")).await.unwrap().unwrap();
    assert_eq!(mugs.available, 8);
}

#[tokio::test]
async fn test_checkout_missing_city_is_rejected() {
    let (app, _, store) = setup().await;
    let mut body = checkout_body(None);
    body["shipping_address"]["city"] = json!("");

    let (status, json) = send(&app, post_json("/checkout", &body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("city"));
    assert_eq!(store.order_count().await, 0);
}

#[tokio::test]
async fn test_checkout_total_mismatch_is_rejected() {
    let (app, _, store) = setup().await;
    let mut body = checkout_body(None);
    body["totals"]["total"] = json!(5000);

    let (status, _) = send(&app, post_json("/checkout", &body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(store.order_count().await, 0);
}

#[tokio::test]
async fn test_checkout_item_failure_reports_order_id() {
    let (app, _, store) = setup().await;
    store.set_fail_on_insert_items(true).await;

    let (status, json) = send(&app, post_json("/checkout", &checkout_body(None))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let order_id = json["order_id"].as_str().unwrap().to_string();

    let (status, order) = send(&app, get(&format!("/orders/{order_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "error_items_failed");
    assert!(order["notes"].as_str().unwrap().starts_with("Order items failed to persist"));
    assert_eq!(order["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_get_order_with_items() {
    let (app, _, _) = setup().await;
    let order_id = place_order(&app, None).await;

    let (status, json) = send(&app, get(&format!("/orders/{order_id}"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], order_id.as_str());
    let items = json["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().any(|i| i["product_id"] == "SKU-MUG" && i["subtotal"] == 3600));
}

#[tokio::test]
async fn test_get_order_invalid_id() {
    let (app, _, _) = setup().await;

    let (status, _) = send(&app, get("/orders/not-a-uuid")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_order_not_found() {
    let (app, _, _) = setup().await;

    let (status, _) = send(&app, get(&format!("/orders/{}", uuid::Uuid::new_v4()))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_orders_filters_by_channel() {
    let (app, _, _) = setup().await;
    place_order(&app, None).await;
    place_order(&app, None).await;

    let (status, json) = send(&app, get("/orders")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 2);

    let (status, json) = send(&app, get("/orders?channel=pos")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json.as_array().unwrap().is_empty());

    let (_, json) = send(&app, get("/orders?limit=1")).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_sync_log_records_every_target() {
    let (app, state, _) = setup().await;
    state
        .coordinator
        .dispatcher()
        .accounting()
        .as_recording()
        .unwrap()
        .set_fail_on_trigger(true);

    let order_id = place_order(&app, None).await;
    let (status, json) = send(&app, get(&format!("/orders/{order_id}/sync-log"))).await;

    assert_eq!(status, StatusCode::OK);
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 3);

    let accounting = entries.iter().find(|e| e["target"] == "accounting").unwrap();
    assert_eq!(accounting["status"], "failed_trigger");
    assert!(accounting["error"].is_string());

    for target in ["marketing", "shipping"] {
        let entry = entries.iter().find(|e| e["target"] == target).unwrap();
        assert_eq!(entry["status"], "triggered");
    }
    let shipping = state.coordinator.dispatcher().shipping();
    assert_eq!(shipping.as_recording().unwrap().call_count(), 1);
}

#[tokio::test]
async fn test_sync_log_unknown_order() {
    let (app, _, _) = setup().await;

    let uri = format!("/orders/{}/sync-log", uuid::Uuid::new_v4());
    let (status, _) = send(&app, get(&uri)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pos_sale_prices_and_returns_change() {
    let config = Config {
        pos_tax_rate_bps: 1000,
        ..Config::default()
    };
    let (app, _, store) = setup_with_config(config).await;

    let body = json!({
        "customer": { "name": "Walk-in", "email": "walkin@example.com" },
        "items": [
            { "product_id": "SKU-MUG", "quantity": 1, "unit_price": 1800, "name": "Enamel Mug" },
            { "product_id": "SKU-MUG", "quantity": 1, "unit_price": 1800, "name": "Enamel Mug" }
        ],
        "payment_method": "cash",
        "amount_received": 4000
    });
    let (status, json) = send(&app, post_json("/pos/sales", &body)).await;

    assert_eq!(status, StatusCode::CREATED, "pos sale failed: {json}");
    assert_eq!(json["order"]["channel"], "pos");
    assert_eq!(json["order"]["status"], "completed");
    assert_eq!(json["order"]["payment_method"], "cash");
    assert_eq!(json["order"]["totals"]["subtotal"], 3600);
    assert_eq!(json["order"]["totals"]["tax"], 360);
    assert_eq!(json["order"]["totals"]["total"], 3960);
    assert_eq!(json["change_due"], 40);

    let order_id = json["order"]["id"].as_str().unwrap();
    let (_, detail) = send(&app, get(&format!("/orders/{order_id}"))).await;
    assert_eq!(detail["items"].as_array().unwrap().len(), 1);
    assert_eq!(detail["items"][0]["quantity"], 2);

    let mugs = store.get_stock(&ProductId::new("SKU-MUG")).await.unwrap().unwrap();
    assert_eq!(mugs.available, 8);
}

#[tokio::test]
async fn test_pos_sale_short_tender_is_rejected() {
    let (app, _, store) = setup().await;

    let body = json!({
        "customer": { "name": "Walk-in", "email": "walkin@example.com" },
        "items": [
            { "product_id": "SKU-TEA", "quantity": 1, "unit_price": 1250, "name": "Loose Leaf Tea" }
        ],
        "payment_method": "cash",
        "amount_received": 1000
    });
    let (status, _) = send(&app, post_json("/pos/sales", &body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(store.order_count().await, 0);
}

#[tokio::test]
async fn test_pos_sale_quantity_overflow_is_rejected() {
    let (app, _, store) = setup().await;

    let body = json!({
        "customer": { "name": "Walk-in", "email": "walkin@example.com" },
        "items": [
            { "product_id": "SKU-MUG", "quantity": u32::MAX, "unit_price": 1800, "name": "Enamel Mug" },
            { "product_id": "SKU-MUG", "quantity": 1, "unit_price": 1800, "name": "Enamel Mug" }
        ],
        "payment_method": "cash",
        "amount_received": 4000
    });
    let (status, json) = send(&app, post_json("/pos/sales", &body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST, "unexpected response: {json}");
    assert_eq!(store.order_count().await, 0);
    let mugs = store.get_stock(&ProductId::new("SKU-MUG")).await.unwrap().unwrap();
    assert_eq!(mugs.available, 10);
}

#[tokio::test]
async fn test_loyalty_tiers_are_seeded() {
    let (app, _, _) = setup().await;

    let (status, json) = send(&app, get("/loyalty/tiers")).await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Bronze", "Silver", "Gold"]);
}

#[tokio::test]
async fn test_checkout_accrues_loyalty_points() {
    let (app, _, _) = setup().await;
    let account_id = uuid::Uuid::new_v4().to_string();

    place_order(&app, Some(&account_id)).await;
    let (status, json) = send(&app, get(&format!("/loyalty/{account_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["points"], 58);
    assert_eq!(json["tier"], "Bronze");

    place_order(&app, Some(&account_id)).await;
    let (_, json) = send(&app, get(&format!("/loyalty/{account_id}"))).await;
    assert_eq!(json["points"], 116);
    assert_eq!(json["tier"], "Silver");
}

#[tokio::test]
async fn test_loyalty_unknown_account() {
    let (app, _, _) = setup().await;

    let (status, _) = send(&app, get(&format!("/loyalty/{}", uuid::Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, get("/loyalty/not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_inventory_get_and_restock() {
    let (app, _, _) = setup().await;

    let (status, json) = send(&app, get("/inventory/SKU-TEA")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["available"], 10);

    let (status, json) = send(
        &app,
        post_json("/inventory/SKU-TEA/restock", &json!({ "quantity": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["available"], 15);

    let (status, _) = send(
        &app,
        post_json("/inventory/SKU-TEA/restock", &json!({ "quantity": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/inventory/SKU-NONE")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_checkout_succeeds_when_stock_runs_short() {
    let (app, _, store) = setup().await;
    store
        .set_stock(&ProductId::new("SKU-TEA"), 0)
        .await
        .unwrap();

    place_order(&app, None).await;

    let tea = store.get_stock(&ProductId::new("SKU-TEA")).await.unwrap().unwrap();
    assert_eq!(tea.available, 0);
    let mugs = store.get_stock(&ProductId::new("SKU-MUG")).await.unwrap().unwrap();
    assert_eq!(mugs.available, 8);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _, _) = setup().await;
    place_order(&app, None).await;

    let response = app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("checkouts_total"));
    assert!(text.contains("sync_attempts_total"));
}
