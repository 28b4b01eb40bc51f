//! End-to-end API tests
//!
//! Drives the full router (auth middleware included) in-process with
//! `tower::ServiceExt::oneshot` against an in-memory store.

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use order_server::core::build_router;
use order_server::sequence::SequencerConfig;
use order_server::{Config, OrderStore, ServerState};

const TOKEN: &str = "test-token";

fn test_config(suppress_emails: bool, suppress_stock: bool) -> Config {
    let mut config = Config::with_overrides("unused", 0);
    config.admin_token = TOKEN.into();
    config.suppress_order_emails = suppress_emails;
    config.suppress_stock_reduction = suppress_stock;
    config.sequencer = SequencerConfig {
        lock_wait: Duration::from_millis(100),
        max_attempts: 5,
        retry_backoff: Duration::from_millis(10),
        lock_ttl: Duration::from_secs(30),
    };
    config
}

fn app_with(suppress_emails: bool, suppress_stock: bool) -> (Router, OrderStore) {
    let store = OrderStore::open_in_memory().unwrap();
    let state = ServerState::with_store(test_config(suppress_emails, suppress_stock), store.clone());
    (build_router(state), store)
}

fn app() -> (Router, OrderStore) {
    app_with(false, false)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn authed(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN));
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn order_payload() -> Value {
    json!({
        "customer_id": "cust-1",
        "items": [
            { "product_id": "p-1", "name": "Widget", "quantity": 2, "unit_price": "2.50" },
            { "product_id": "p-2", "name": "Gadget", "quantity": 1, "unit_price": "10.00" }
        ],
        "note": "leave at the door"
    })
}

async fn create_order(app: &Router) -> Value {
    let (status, body) = send(app, authed("POST", "/api/orders", Some(order_payload()))).await;
    assert_eq!(status, StatusCode::OK);
    body["data"].clone()
}

#[tokio::test]
async fn health_is_public() {
    let (app, _) = app();
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn api_requires_admin_token() {
    let (app, _) = app();

    let request = Request::builder()
        .uri("/api/sequence")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "E3001");

    let request = Request::builder()
        .uri("/api/sequence")
        .header(header::AUTHORIZATION, "Bearer wrong-token")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "E2001");
}

#[tokio::test]
async fn create_order_assigns_number_and_runs_pipeline() {
    let (app, store) = app();
    store.set_stock("p-1", 10).unwrap();
    store.set_stock("p-2", 5).unwrap();

    let order = create_order(&app).await;
    assert_eq!(order["number"]["number"], 1);
    assert_eq!(order["number"]["fallback"], false);

    // counter advanced
    let (status, body) = send(&app, authed("GET", "/api/sequence", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["last_sequential_number"], 1);

    // stock reduced per line
    assert_eq!(store.get_stock("p-1").unwrap(), 8);
    assert_eq!(store.get_stock("p-2").unwrap(), 4);

    // both order emails queued
    assert_eq!(store.list_outbox().unwrap().len(), 2);
}

#[tokio::test]
async fn import_mode_suppresses_emails_and_stock() {
    let (app, store) = app_with(true, true);
    store.set_stock("p-1", 10).unwrap();

    let order = create_order(&app).await;
    // still numbered
    assert_eq!(order["number"]["number"], 1);

    assert!(store.list_outbox().unwrap().is_empty());
    assert_eq!(store.get_stock("p-1").unwrap(), 10);
}

#[tokio::test]
async fn create_rejects_empty_items() {
    let (app, _) = app();
    let payload = json!({ "items": [] });
    let (status, body) = send(&app, authed("POST", "/api/orders", Some(payload))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E0002");
}

#[tokio::test]
async fn backdate_rewrites_created_and_paid_dates() {
    let (app, _) = app();
    let order = create_order(&app).await;
    let id = order["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        authed(
            "POST",
            &format!("/api/orders/{}/backdate", id),
            Some(json!({ "date": "2020-01-02 03:04:05" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert!(
        data["verified_created_at"]
            .as_str()
            .unwrap()
            .starts_with("2020-01-02T03:04:05")
    );
    assert_eq!(data["verified_created_at"], data["verified_paid_at"]);

    // backdating does not renumber
    let (_, detail) = send(&app, authed("GET", &format!("/api/orders/{}", id), None)).await;
    assert_eq!(detail["data"]["number"]["number"], 1);
}

#[tokio::test]
async fn backdate_unknown_order_is_404_and_bad_date_is_400() {
    let (app, _) = app();

    let (status, _) = send(
        &app,
        authed(
            "POST",
            "/api/orders/missing/backdate",
            Some(json!({ "date": "2020-01-02" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let order = create_order(&app).await;
    let id = order["id"].as_str().unwrap();
    let (status, body) = send(
        &app,
        authed(
            "POST",
            &format!("/api/orders/{}/backdate", id),
            Some(json!({ "date": "not-a-date" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E0002");
}

#[tokio::test]
async fn custom_statuses_round_trip() {
    let (app, _) = app();
    let order = create_order(&app).await;
    let id = order["id"].as_str().unwrap();

    for status_name in ["shipped", "returned", "partially-returned", "completed"] {
        let (status, body) = send(
            &app,
            authed(
                "PUT",
                &format!("/api/orders/{}/status", id),
                Some(json!({ "status": status_name })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], status_name);
    }
}

#[tokio::test]
async fn customer_notes_surface_on_order_detail() {
    let (app, _) = app();

    let (status, _) = send(
        &app,
        authed(
            "PUT",
            "/api/customers/cust-1/notes",
            Some(json!({ "name": "Pat Doe", "notes": "always ships freight" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let order = create_order(&app).await;
    let id = order["id"].as_str().unwrap();

    let (status, body) = send(&app, authed("GET", &format!("/api/orders/{}", id), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["customer_notes"], "always ships freight");
}

#[tokio::test]
async fn listing_sorts_by_assigned_number() {
    let (app, _) = app();
    for _ in 0..3 {
        create_order(&app).await;
    }

    let (status, body) = send(&app, authed("GET", "/api/orders?sort=desc", None)).await;
    assert_eq!(status, StatusCode::OK);

    let numbers: Vec<u64> = body["data"]["orders"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["number"].as_u64().unwrap())
        .collect();
    assert_eq!(numbers, vec![3, 2, 1]);
    assert_eq!(body["data"]["pagination"]["total"], 3);

    let (_, body) = send(&app, authed("GET", "/api/orders?sort=asc", None)).await;
    let numbers: Vec<u64> = body["data"]["orders"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["number"].as_u64().unwrap())
        .collect();
    assert_eq!(numbers, vec![1, 2, 3]);
}
