//! Integration tests for the API server.

use std::sync::OnceLock;

use api::config::Config;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use record_store::InMemoryRecordStore;
use serde_json::{Value, json};
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

fn setup() -> axum::Router {
    let state = api::create_default_state(InMemoryRecordStore::new(), &Config::default());
    api::create_app(state, get_metrics_handle())
}

/// An identity as the gateway would assert it.
#[derive(Clone)]
struct Identity {
    id: String,
    role: &'static str,
}

fn request(
    method: &str,
    uri: &str,
    caller: Option<&Identity>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
        builder = builder
            .header("x-account-id", caller.id.as_str())
            .header("x-account-role", caller.role);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
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

async fn register(app: &axum::Router, role: &'static str, email: &str) -> Identity {
    let (status, json) = send(
        app,
        request(
            "POST",
            "/accounts",
            None,
            Some(json!({
                "role": role,
                "name": "Test User",
                "email": email,
                "credential_hash": "hash"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(json.get("credential_hash").is_none());
    Identity {
        id: json["id"].as_str().unwrap().to_string(),
        role,
    }
}

/// Supplier, merchant and shipping company accounts plus one product with stock 10.
struct World {
    app: axum::Router,
    supplier: Identity,
    merchant: Identity,
    company: Identity,
    product_id: String,
}

async fn world() -> World {
    let app = setup();
    let supplier = register(&app, "supplier", "supplier@example.com").await;
    let merchant = register(&app, "merchant", "merchant@example.com").await;
    let company = register(&app, "shipping_company", "courier@example.com").await;

    let (status, product) = send(
        &app,
        request(
            "POST",
            "/products",
            Some(&supplier),
            Some(json!({
                "name": "Dates",
                "description": "Khalas dates",
                "price_cents": 1250,
                "quantity": 10
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(product["category"], "general");

    World {
        app,
        supplier,
        merchant,
        company,
        product_id: product["id"].as_str().unwrap().to_string(),
    }
}

impl World {
    async fn place_order(&self, quantity: i64) -> (StatusCode, Value) {
        send(
            &self.app,
            request(
                "POST",
                "/orders",
                Some(&self.merchant),
                Some(json!({
                    "product_id": self.product_id,
                    "quantity": quantity,
                    "shipping_address": "Olaya St, Riyadh"
                })),
            ),
        )
        .await
    }

    async fn set_order_status(&self, order_id: &str, status: &str) -> (StatusCode, Value) {
        send(
            &self.app,
            request(
                "PATCH",
                &format!("/orders/{order_id}/status"),
                Some(&self.supplier),
                Some(json!({"status": status})),
            ),
        )
        .await
    }

    async fn ready_order(&self) -> String {
        let (_, order) = self.place_order(3).await;
        let order_id = order["id"].as_str().unwrap().to_string();
        for status in ["accepted", "processing", "ready"] {
            let (code, _) = self.set_order_status(&order_id, status).await;
            assert_eq!(code, StatusCode::OK);
        }
        order_id
    }

    async fn claim(&self, order_id: &str) -> (StatusCode, Value) {
        send(
            &self.app,
            request(
                "POST",
                "/shipments",
                Some(&self.company),
                Some(json!({
                    "order_id": order_id,
                    "estimated_delivery_date": "2026-10-21",
                    "shipping_cost_cents": 50
                })),
            ),
        )
        .await
    }

    async fn stock(&self) -> i64 {
        let (_, product) = send(
            &self.app,
            request("GET", &format!("/products/{}", self.product_id), None, None),
        )
        .await;
        product["quantity"].as_i64().unwrap()
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();
    let (status, json) = send(&app, request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();
    let response = app
        .oneshot(request("GET", "/metrics", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = setup();
    let (status, json) = send(&app, request("GET", "/warehouses", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
    assert_eq!(json["message"], "no route for GET /warehouses");
}

#[tokio::test]
async fn test_order_to_delivery_over_http() {
    let w = world().await;

    let (status, order) = w.place_order(3).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "pending");
    assert_eq!(order["total_amount_cents"], 3750);
    assert_eq!(w.stock().await, 7);

    let (status, err) = w.place_order(8).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"], "insufficient_stock");
    assert_eq!(w.stock().await, 7);

    let order_id = order["id"].as_str().unwrap();
    for status in ["accepted", "processing", "ready"] {
        let (code, body) = w.set_order_status(order_id, status).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["status"], status);
    }

    let (status, board) = send(
        &w.app,
        request("GET", "/shipping/available-orders", Some(&w.company), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(board.as_array().unwrap().len(), 1);

    let (status, shipment) = w.claim(order_id).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(shipment["pickup_address"], "Supplier Address");
    assert!(
        shipment["tracking_number"]
            .as_str()
            .unwrap()
            .starts_with("TRK")
    );
    let shipment_id = shipment["id"].as_str().unwrap();

    let (status, delivered) = send(
        &w.app,
        request(
            "PATCH",
            &format!("/shipments/{shipment_id}/status"),
            Some(&w.company),
            Some(json!({"status": "delivered", "location": "Riyadh"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(delivered["status"], "delivered");
    assert!(delivered["delivered_at"].is_string());
    assert_eq!(delivered["status_history"].as_array().unwrap().len(), 2);

    let (status, details) = send(
        &w.app,
        request("GET", &format!("/orders/{order_id}"), Some(&w.merchant), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["status"], "completed");
    assert_eq!(details["shipment_id"], shipment["id"]);
    assert_eq!(details["shipment"]["status"], "delivered");
}

#[tokio::test]
async fn test_identity_is_required() {
    let w = world().await;

    let (status, err) = send(
        &w.app,
        request(
            "POST",
            "/orders",
            None,
            Some(json!({"product_id": w.product_id, "quantity": 1, "shipping_address": "x"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(err["error"], "unauthorized");

    let bogus = Identity {
        id: "not-a-uuid".to_string(),
        role: "merchant",
    };
    let (status, _) = send(&w.app, request("GET", "/orders", Some(&bogus), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_role_and_ownership_are_enforced() {
    let w = world().await;

    // Suppliers cannot place orders.
    let (status, err) = send(
        &w.app,
        request(
            "POST",
            "/orders",
            Some(&w.supplier),
            Some(json!({"product_id": w.product_id, "quantity": 1, "shipping_address": "x"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(err["error"], "permission_denied");

    let (_, order) = w.place_order(1).await;
    let order_id = order["id"].as_str().unwrap();

    let other_supplier = register(&w.app, "supplier", "other@example.com").await;
    let (status, _) = send(
        &w.app,
        request(
            "PATCH",
            &format!("/orders/{order_id}/status"),
            Some(&other_supplier),
            Some(json!({"status": "accepted"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &w.app,
        request("GET", &format!("/orders/{order_id}"), Some(&other_supplier), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &w.app,
        request(
            "PATCH",
            &format!("/products/{}", w.product_id),
            Some(&other_supplier),
            Some(json!({"price_cents": 1})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_invalid_input_and_state_errors() {
    let w = world().await;

    let (status, err) = w.place_order(0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "invalid_argument");

    let (status, err) = send(
        &w.app,
        request("POST", "/orders", Some(&w.merchant), Some(json!({"quantity": 1}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "invalid_argument");

    let (status, err) = send(
        &w.app,
        request("GET", "/products/not-a-uuid", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "invalid_argument");

    let (status, err) = send(
        &w.app,
        request(
            "GET",
            "/products/1b4e28ba-2fa1-11d2-883f-0016d3cca427",
            None,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"], "not_found");

    let (_, order) = w.place_order(1).await;
    let order_id = order["id"].as_str().unwrap();

    let (status, err) = w.set_order_status(order_id, "shipped").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "invalid_argument");

    let (status, err) = w.set_order_status(order_id, "ready").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"], "invalid_transition");

    let (status, err) = w.claim(order_id).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"], "invalid_state");
    assert_eq!(err["message"], "Invalid state: order is not ready for shipping");
}

#[tokio::test]
async fn test_second_claim_fails() {
    let w = world().await;
    let order_id = w.ready_order().await;

    let (status, _) = w.claim(&order_id).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, err) = w.claim(&order_id).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"], "invalid_state");

    let (_, shipments) = send(&w.app, request("GET", "/shipments", Some(&w.company), None)).await;
    assert_eq!(shipments.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_tracking() {
    let w = world().await;
    let order_id = w.ready_order().await;
    w.claim(&order_id).await;

    let (status, view) = send(
        &w.app,
        request(
            "GET",
            &format!("/orders/{order_id}/track?email=Merchant%40Example.com"),
            None,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["status"], "shipped");
    assert_eq!(view["product_name"], "Dates");
    assert_eq!(view["tracking"]["status"], "pending");
    assert_eq!(
        view["tracking"]["status_history"].as_array().unwrap().len(),
        1
    );

    let (status, err) = send(
        &w.app,
        request("GET", &format!("/orders/{order_id}/track"), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "invalid_argument");

    let (status, _) = send(
        &w.app,
        request(
            "GET",
            &format!("/orders/{order_id}/track?email=stranger%40example.com"),
            None,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_catalog_and_dashboards() {
    let w = world().await;

    let (status, products) = send(
        &w.app,
        request("GET", "/products?search=DATES", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(products.as_array().unwrap().len(), 1);

    let (_, products) = send(
        &w.app,
        request("GET", "/products?category=electronics", None, None),
    )
    .await;
    assert!(products.as_array().unwrap().is_empty());

    w.place_order(2).await;

    let (status, dashboard) = send(
        &w.app,
        request("GET", "/dashboard", Some(&w.supplier), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["role"], "supplier");
    assert_eq!(dashboard["statistics"]["total_products"], 1);
    assert_eq!(dashboard["statistics"]["pending_orders"], 1);
    assert_eq!(dashboard["products"][0]["id"], w.product_id.as_str());
    assert_eq!(dashboard["orders"].as_array().unwrap().len(), 1);

    let (_, dashboard) = send(
        &w.app,
        request("GET", "/dashboard", Some(&w.merchant), None),
    )
    .await;
    assert_eq!(dashboard["role"], "merchant");
    assert_eq!(dashboard["statistics"]["total_orders"], 1);
    assert_eq!(dashboard["available_products"].as_array().unwrap().len(), 1);

    let (_, dashboard) = send(
        &w.app,
        request("GET", "/dashboard", Some(&w.company), None),
    )
    .await;
    assert_eq!(dashboard["role"], "shipping_company");
    assert!(dashboard["available_orders"].as_array().unwrap().is_empty());

    let (status, orders) = send(
        &w.app,
        request("GET", "/orders?status=pending", Some(&w.merchant), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicate_account_email() {
    let app = setup();
    register(&app, "merchant", "dup@example.com").await;

    let (status, err) = send(
        &app,
        request(
            "POST",
            "/accounts",
            None,
            Some(json!({
                "role": "supplier",
                "name": "Dup",
                "email": "DUP@example.com",
                "credential_hash": "h"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"], "conflict");
}

#[tokio::test]
async fn test_registration_accepts_legacy_role_names() {
    let app = setup();

    let (status, account) = send(
        &app,
        request(
            "POST",
            "/accounts",
            None,
            Some(json!({
                "role": "shipping",
                "name": "Ops Desk",
                "company_name": "Fast Couriers",
                "email": "ops@courier.example",
                "credential_hash": "hash"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(account["role"], "shipping_company");
    assert_eq!(account["name"], "Ops Desk");
    assert_eq!(account["company_name"], "Fast Couriers");

    let retailer = register(&app, "retailer", "shop@example.com").await;
    let (status, orders) = send(&app, request("GET", "/orders", Some(&retailer), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(orders.as_array().unwrap().is_empty());
}
