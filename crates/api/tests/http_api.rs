//! End-to-end tests through the full router and middleware stack.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use mediabuy_api::engine::Registry;
use mediabuy_db::MemoryStore;

use common::{body_json, build_test_app, get, post_json};

fn app() -> (Arc<MemoryStore>, axum::Router) {
    let store = Arc::new(MemoryStore::new());
    (store.clone(), build_test_app(store))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_store_state() {
    let (store, app) = app();

    let response = get(app.clone(), "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["store"], "memory");
    assert_eq!(json["db_healthy"], true);
    assert_eq!(json["intents"], Registry::builtin().unwrap().len());

    store.set_unavailable(true);
    let json = body_json(get(app, "/health").await).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["db_healthy"], false);
}

// ---------------------------------------------------------------------------
// Execute
// ---------------------------------------------------------------------------

#[tokio::test]
async fn execute_returns_the_envelope_with_a_matching_status() {
    let (_, app) = app();

    let response = post_json(
        app.clone(),
        "/api/v1/execute",
        json!({"intention": "CREATE_CLIENT", "params": {"nombre": "Acme", "rut": "12.345.678-5"}}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["estado"], "activo");

    let response = post_json(
        app.clone(),
        "/api/v1/execute",
        json!({"intention": "CREATE_CLIENT", "params": {}}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    let response = post_json(
        app.clone(),
        "/api/v1/execute",
        json!({"intention": "GET_CLIENT", "params": {"id": 2}}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = post_json(app, "/api/v1/execute", json!({"intention": "DROP_ALL"})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "UNKNOWN_INTENTION");
}

#[tokio::test]
async fn execute_without_params_uses_an_empty_object() {
    let (_, app) = app();
    let response = post_json(app, "/api/v1/execute", json!({"intention": "GET_CLIENT_STATS"})).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["total"], 0);
}

#[tokio::test]
async fn malformed_body_is_a_validation_envelope() {
    let (_, app) = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/execute")
        .header("content-type", "application/json")
        .body(Body::from("{\"intention\": "))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("Validation failed: Invalid request body"));
}

#[tokio::test]
async fn store_outage_is_a_server_error() {
    let (store, app) = app();
    store.set_unavailable(true);

    let response = post_json(app, "/api/v1/execute", json!({"intention": "SEARCH_ORDERS"})).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["code"], "DATABASE_ERROR");
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let (_, app) = app();
    let response = get(app.clone(), "/health").await;
    assert!(response.headers().contains_key("x-request-id"));

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-123")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-123");
}

// ---------------------------------------------------------------------------
// Intentions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn intentions_list_every_descriptor() {
    let (_, app) = app();
    let expected = Registry::builtin().unwrap().len();

    let json = body_json(get(app.clone(), "/api/v1/intentions").await).await;
    assert_eq!(json["count"], expected);
    assert_eq!(json["data"].as_array().unwrap().len(), expected);

    let json = body_json(get(app, "/api/v1/intentions?handler=client").await).await;
    assert_eq!(json["count"], 8);
    assert!(json["data"]
        .as_array()
        .unwrap()
        .iter()
        .all(|d| d["handler"] == "client"));
}

#[tokio::test]
async fn unknown_handler_filter_is_rejected() {
    let (_, app) = app();
    let response = get(app, "/api/v1/intentions?handler=billing").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn single_intention_lookup() {
    let (_, app) = app();

    let response = get(app.clone(), "/api/v1/intentions/DELETE_ORDER").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["name"], "DELETE_ORDER");
    assert_eq!(json["handler"], "order");
    assert_eq!(json["phase"], "delete");
    assert_eq!(json["requiredParams"], json!(["id"]));
    assert_eq!(json["optionalParams"], json!(["force"]));

    let response = get(app.clone(), "/api/v1/intentions/GENERATE_ORDER_NUMBER").await;
    let json = body_json(response).await;
    assert!(json["description"]
        .as_str()
        .unwrap()
        .contains("without reserving it"));

    let response = get(app, "/api/v1/intentions/DELETE_EVERYTHING").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "UNKNOWN_INTENTION");
}
