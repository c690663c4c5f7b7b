//! Dispatcher resolution order and failure conversion.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use serde_json::json;

use mediabuy_api::config::EngineSettings;
use mediabuy_api::engine::{Dispatcher, Intent, Registry};
use mediabuy_api::envelope::{Envelope, ErrorKind};
use mediabuy_api::handlers::ClientHandler;
use mediabuy_db::{MemoryStore, Query, Record, Store, StoreError, Table};

use common::{engine, params, run};

// ---------------------------------------------------------------------------
// Test: every required param, omitted, is reported without touching the store
// ---------------------------------------------------------------------------

#[tokio::test]
async fn omitted_required_params_never_reach_the_store() {
    let (store, dispatcher) = engine();

    for descriptor in dispatcher.registry().all() {
        for omitted in descriptor.required_params {
            let mut p = serde_json::Map::new();
            for name in descriptor.required_params.iter().filter(|n| *n != omitted) {
                p.insert(name.to_string(), json!(1));
            }

            let envelope = dispatcher.execute_intention(descriptor.name, p).await;

            assert_eq!(
                envelope.code(),
                Some(ErrorKind::MissingParams),
                "{} without {omitted}",
                descriptor.name
            );
            let json = serde_json::to_value(&envelope).unwrap();
            assert_eq!(json["missingParams"], json!([omitted]));
        }
    }

    assert_eq!(store.operation_count(), 0);
}

#[tokio::test]
async fn null_counts_as_missing() {
    let (store, dispatcher) = engine();
    let json = run(&dispatcher, "GET_CLIENT", json!({"id": null})).await;

    assert_eq!(json["code"], "MISSING_PARAMS");
    assert_eq!(json["missingParams"], json!(["id"]));
    assert_eq!(store.operation_count(), 0);
}

#[tokio::test]
async fn all_missing_params_are_listed_in_declaration_order() {
    let (_, dispatcher) = engine();
    let json = run(&dispatcher, "ADD_ORDER_DETAIL", json!({"cantidad": 2})).await;

    assert_eq!(json["code"], "MISSING_PARAMS");
    assert_eq!(
        json["missingParams"],
        json!(["id_orden", "descripcion", "precio_unitario"])
    );
}

// ---------------------------------------------------------------------------
// Test: unknown intentions and missing handlers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_intention_is_rejected_before_the_store() {
    let (store, dispatcher) = engine();
    let json = run(&dispatcher, "CREATE_INVOICE", json!({})).await;

    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "UNKNOWN_INTENTION");
    assert_eq!(json["error"], "Unknown intention 'CREATE_INVOICE'");
    assert_eq!(store.operation_count(), 0);
}

#[tokio::test]
async fn intention_names_are_case_sensitive() {
    let (_, dispatcher) = engine();
    let envelope = dispatcher
        .execute_intention("create_client", params(json!({})))
        .await;
    assert_eq!(envelope.code(), Some(ErrorKind::UnknownIntention));
}

#[tokio::test]
async fn intents_without_a_registered_handler_fail_fast() {
    let store = Arc::new(MemoryStore::new());
    let dispatcher = Dispatcher::builder(Registry::builtin().unwrap())
        .client(ClientHandler::new(store.clone(), EngineSettings::default()))
        .build();

    // Missing params are not even checked when the handler is absent.
    let envelope = dispatcher
        .execute_intention("GET_ORDER", params(json!({})))
        .await;
    assert_eq!(envelope.code(), Some(ErrorKind::HandlerNotFound));
    assert_eq!(
        envelope.status_code(),
        axum::http::StatusCode::NOT_IMPLEMENTED
    );

    let envelope = dispatcher
        .execute_intention("GET_CLIENT_STATS", params(json!({})))
        .await;
    assert!(envelope.is_success());
    assert!(store.operation_count() >= 1);
}

#[tokio::test]
async fn every_intent_has_a_handler_in_the_default_build() {
    let (_, dispatcher) = engine();
    for intent in Intent::ALL {
        let descriptor = dispatcher.registry().get(intent.name()).unwrap();
        assert!(dispatcher.has_handler(descriptor.handler), "{}", intent.name());
    }
}

// ---------------------------------------------------------------------------
// Test: failures inside handlers
// ---------------------------------------------------------------------------

/// A store whose every call panics.
struct PanickingStore;

#[async_trait]
impl Store for PanickingStore {
    async fn select(&self, _table: Table, _query: &Query) -> Result<Vec<Record>, StoreError> {
        panic!("connection pool poisoned")
    }

    async fn insert(&self, _table: Table, _record: Record) -> Result<Record, StoreError> {
        panic!("connection pool poisoned")
    }

    async fn update(
        &self,
        _table: Table,
        _id: i64,
        _patch: Record,
    ) -> Result<Option<Record>, StoreError> {
        panic!("connection pool poisoned")
    }

    async fn delete(&self, _table: Table, _id: i64) -> Result<bool, StoreError> {
        panic!("connection pool poisoned")
    }

    async fn ping(&self) -> Result<(), StoreError> {
        panic!("connection pool poisoned")
    }

    fn backend(&self) -> &'static str {
        "panicking"
    }
}

#[tokio::test]
async fn a_panicking_handler_becomes_execution_error() {
    let dispatcher = Dispatcher::new(Arc::new(PanickingStore), EngineSettings::default()).unwrap();

    let envelope = dispatcher
        .execute_intention("GET_CLIENT", params(json!({"id": 1})))
        .await;

    assert_matches!(&envelope, Envelope::Failure(err) if err.kind == ErrorKind::ExecutionError);
    let json = serde_json::to_value(&envelope).unwrap();
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("connection pool poisoned"));
}

#[tokio::test]
async fn an_unavailable_store_becomes_database_error() {
    let (store, dispatcher) = engine();
    store.set_unavailable(true);

    let json = run(&dispatcher, "SEARCH_CLIENTS", json!({})).await;

    assert_eq!(json["code"], "DATABASE_ERROR");
    assert!(json["error"].as_str().unwrap().contains("offline"));
}

#[tokio::test]
async fn a_malformed_stored_record_becomes_exception() {
    let (store, dispatcher) = engine();
    let mut record = Record::new();
    record.insert("nombre".into(), json!("Acme"));
    record.insert("estado".into(), json!("desconocido"));
    store.insert(Table::Clients, record).await.unwrap();

    let json = run(&dispatcher, "GET_CLIENT", json!({"id": 1})).await;

    assert_eq!(json["code"], "EXCEPTION");
}

// ---------------------------------------------------------------------------
// Test: successful dispatch returns the handler's envelope verbatim
// ---------------------------------------------------------------------------

#[tokio::test]
async fn success_envelope_carries_data_message_and_count() {
    let (_, dispatcher) = engine();
    common::create_client(&dispatcher, "Acme").await;

    let json = run(&dispatcher, "SEARCH_CLIENTS", json!({"nombre": "acm"})).await;

    assert_eq!(json["success"], true);
    assert_eq!(json["count"], 1);
    assert_eq!(json["message"], "Found 1 clients");
    assert_eq!(json["data"][0]["nombre"], "Acme");
}
