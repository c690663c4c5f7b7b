mod common;

use serde_json::json;

use mediabuy_db::Table;

use common::{create_client, create_order, create_provider, engine, ok, run};

#[tokio::test]
async fn create_applies_default_terms() {
    let (_, dispatcher) = engine();
    let data = ok(
        &dispatcher,
        "CREATE_PROVIDER",
        json!({"nombre": "Canal 13", "rut": "7.654.321-6"}),
    )
    .await;

    assert_eq!(data["estado"], "activo");
    assert_eq!(data["comision"].as_f64(), Some(0.0));
    assert_eq!(data["dias_pago"], 30);
}

#[tokio::test]
async fn commission_and_payment_days_are_range_checked() {
    let (store, dispatcher) = engine();

    let json = run(
        &dispatcher,
        "CREATE_PROVIDER",
        json!({"nombre": "Canal 13", "rut": "7.654.321-6", "comision": 100.5, "dias_pago": 400}),
    )
    .await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(
        json["errors"],
        json!([
            "comision must be between 0 and 100",
            "dias_pago must be between 0 and 365"
        ])
    );
    assert_eq!(store.row_count(Table::Providers).await, 0);

    let data = ok(
        &dispatcher,
        "CREATE_PROVIDER",
        json!({"nombre": "Canal 13", "rut": "7.654.321-6", "comision": 100, "dias_pago": 0}),
    )
    .await;
    assert_eq!(data["comision"].as_f64(), Some(100.0));
    assert_eq!(data["dias_pago"], 0);
}

#[tokio::test]
async fn update_checks_terms_and_keeps_the_rest() {
    let (_, dispatcher) = engine();
    let id = create_provider(&dispatcher, "Radio Bío-Bío").await;

    let json = run(&dispatcher, "UPDATE_PROVIDER", json!({"id": id, "comision": -1})).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let data = ok(&dispatcher, "UPDATE_PROVIDER", json!({"id": id, "comision": 15.5})).await;
    assert_eq!(data["comision"].as_f64(), Some(15.5));
    assert_eq!(data["dias_pago"], 30);
    assert_eq!(data["nombre"], "Radio Bío-Bío");
}

#[tokio::test]
async fn providers_can_be_blocked() {
    let (_, dispatcher) = engine();
    let id = create_provider(&dispatcher, "Canal 13").await;

    let data = ok(
        &dispatcher,
        "CHANGE_PROVIDER_STATUS",
        json!({"id": id, "estado": "bloqueado"}),
    )
    .await;
    assert_eq!(data["estado"], "bloqueado");

    let json = run(
        &dispatcher,
        "CHANGE_PROVIDER_STATUS",
        json!({"id": id, "estado": "eliminado"}),
    )
    .await;
    assert_eq!(json["code"], "INVALID_STATE");
    assert_eq!(
        json["allowedValues"],
        json!(["activo", "inactivo", "suspendido", "bloqueado"])
    );
}

#[tokio::test]
async fn delete_is_refused_while_orders_reference_the_provider() {
    let (store, dispatcher) = engine();
    let client = create_client(&dispatcher, "Acme").await;
    let id = create_provider(&dispatcher, "Canal 13").await;
    create_order(&dispatcher, client, id).await;

    let json = run(&dispatcher, "DELETE_PROVIDER", json!({"id": id})).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "HAS_DEPENDENCIES");
    assert_eq!(json["hasOrders"], true);
    assert_eq!(store.row_count(Table::Providers).await, 1);

    let data = ok(&dispatcher, "DELETE_PROVIDER", json!({"id": id, "force": true})).await;
    assert_eq!(data["deleted"], true);
    assert_eq!(store.row_count(Table::Orders).await, 1);
}

#[tokio::test]
async fn search_by_commission_range() {
    let (_, dispatcher) = engine();
    for (nombre, comision) in [("A", 5.0), ("B", 10.0), ("C", 20.0)] {
        ok(
            &dispatcher,
            "CREATE_PROVIDER",
            json!({"nombre": nombre, "rut": "7.654.321-6", "comision": comision}),
        )
        .await;
    }

    let json = run(
        &dispatcher,
        "SEARCH_PROVIDERS",
        json!({"comision_min": 6, "comision_max": 20, "order_by": "comision", "ascending": false}),
    )
    .await;

    assert_eq!(json["count"], 2);
    assert_eq!(json["data"][0]["nombre"], "C");
    assert_eq!(json["data"][1]["nombre"], "B");
}

#[tokio::test]
async fn stats_average_terms() {
    let (_, dispatcher) = engine();
    let empty = ok(&dispatcher, "GET_PROVIDER_STATS", json!({})).await;
    assert_eq!(empty["total"], 0);
    assert_eq!(empty["comision_promedio"].as_f64(), Some(0.0));

    for (comision, dias) in [(10.0, 30), (15.0, 60), (12.5, 45)] {
        ok(
            &dispatcher,
            "CREATE_PROVIDER",
            json!({"nombre": "P", "rut": "7.654.321-6", "comision": comision, "dias_pago": dias}),
        )
        .await;
    }

    let data = ok(&dispatcher, "GET_PROVIDER_STATS", json!({})).await;
    assert_eq!(data["total"], 3);
    assert_eq!(data["por_estado"]["activo"], 3);
    assert_eq!(data["por_estado"]["bloqueado"], 0);
    assert_eq!(data["comision_promedio"].as_f64(), Some(12.5));
    assert_eq!(data["dias_pago_promedio"].as_f64(), Some(45.0));
}

#[tokio::test]
async fn export_uses_provider_file_name() {
    let (_, dispatcher) = engine();
    create_provider(&dispatcher, "Canal 13").await;

    let json = run(&dispatcher, "EXPORT_PROVIDERS", json!({})).await;
    assert_eq!(json["count"], 1);
    assert!(json["data"]["filename"]
        .as_str()
        .unwrap()
        .starts_with("proveedores_"));
}
