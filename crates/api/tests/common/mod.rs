#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use mediabuy_api::config::{EngineSettings, LogFormat, ServerConfig, StoreBackend};
use mediabuy_api::engine::Dispatcher;
use mediabuy_api::envelope::Envelope;
use mediabuy_api::params::Params;
use mediabuy_api::router::build_app_router;
use mediabuy_api::state::AppState;
use mediabuy_db::{MemoryStore, Record, Store, Table};

/// Build a test `ServerConfig` with safe defaults and the in-memory store.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        store_backend: StoreBackend::Memory,
        database_url: None,
        db_max_connections: 1,
        log_format: LogFormat::Text,
        engine: EngineSettings::default(),
    }
}

/// A fresh store plus a dispatcher with every handler over it.
pub fn engine() -> (Arc<MemoryStore>, Dispatcher) {
    let store = Arc::new(MemoryStore::new());
    let dispatcher = Dispatcher::new(store.clone(), EngineSettings::default())
        .expect("builtin registry is valid");
    (store, dispatcher)
}

/// Build the full application router over `store`, with the same
/// middleware stack production uses.
pub fn build_test_app(store: Arc<MemoryStore>) -> Router {
    let config = test_config();
    let state = AppState::new(store, config.clone()).expect("builtin registry is valid");
    build_app_router(state, &config)
}

/// Turn a `json!({...})` literal into params.
pub fn params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        other => panic!("params must be a JSON object, got {other}"),
    }
}

/// Run an intention and return its envelope serialized as the caller sees it.
pub async fn run(dispatcher: &Dispatcher, intention: &str, value: Value) -> Value {
    let envelope = dispatcher.execute_intention(intention, params(value)).await;
    serde_json::to_value(&envelope).expect("envelope serializes")
}

/// Run an intention that must succeed and return its `data`.
pub async fn ok(dispatcher: &Dispatcher, intention: &str, value: Value) -> Value {
    let envelope = dispatcher.execute_intention(intention, params(value)).await;
    match envelope {
        Envelope::Success(success) => success.data,
        Envelope::Failure(err) => panic!("{intention} failed: {} ({})", err.message, err.kind),
    }
}

/// Insert a raw row, for tables the engine only reads (plans).
pub async fn seed(store: &MemoryStore, table: Table, value: Value) -> Value {
    let record: Record = params(value);
    Value::Object(store.insert(table, record).await.expect("seed insert"))
}

pub async fn create_client(dispatcher: &Dispatcher, nombre: &str) -> i64 {
    let data = ok(
        dispatcher,
        "CREATE_CLIENT",
        serde_json::json!({"nombre": nombre, "rut": "12.345.678-5"}),
    )
    .await;
    data["id"].as_i64().expect("client id")
}

pub async fn create_provider(dispatcher: &Dispatcher, nombre: &str) -> i64 {
    let data = ok(
        dispatcher,
        "CREATE_PROVIDER",
        serde_json::json!({"nombre": nombre, "rut": "7.654.321-6"}),
    )
    .await;
    data["id"].as_i64().expect("provider id")
}

pub async fn create_theme(dispatcher: &Dispatcher, nombre: &str) -> i64 {
    let data = ok(
        dispatcher,
        "CREATE_THEME",
        serde_json::json!({"nombre": nombre, "duracion": 30}),
    )
    .await;
    data["id"].as_i64().expect("theme id")
}

pub async fn create_campaign(dispatcher: &Dispatcher, id_cliente: i64, nombre: &str) -> i64 {
    let data = ok(
        dispatcher,
        "CREATE_CAMPAIGN",
        serde_json::json!({
            "nombre": nombre,
            "id_cliente": id_cliente,
            "fecha_inicio": "2026-03-01",
            "fecha_fin": "2026-03-31",
            "presupuesto": 1000000,
        }),
    )
    .await;
    data["id"].as_i64().expect("campaign id")
}

pub async fn create_order(dispatcher: &Dispatcher, id_cliente: i64, id_proveedor: i64) -> Value {
    ok(
        dispatcher,
        "CREATE_ORDER",
        serde_json::json!({"id_cliente": id_cliente, "id_proveedor": id_proveedor}),
    )
    .await
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
