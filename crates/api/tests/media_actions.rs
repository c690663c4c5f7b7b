mod common;

use serde_json::json;

use mediabuy_db::Table;

use common::{create_campaign, create_client, create_provider, create_theme, engine, ok, run, seed};

// ---------------------------------------------------------------------------
// Media outlets
// ---------------------------------------------------------------------------

#[tokio::test]
async fn media_requires_a_known_type() {
    let (store, dispatcher) = engine();

    let json = run(&dispatcher, "CREATE_MEDIA", json!({"nombre": "Canal 13"})).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["errors"], json!(["tipo is required"]));

    let json = run(
        &dispatcher,
        "CREATE_MEDIA",
        json!({"nombre": "Canal 13", "tipo": "holograma"}),
    )
    .await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json["errors"][0]
        .as_str()
        .unwrap()
        .starts_with("tipo must be one of: television, radio"));
    assert_eq!(store.row_count(Table::Media).await, 0);
}

#[tokio::test]
async fn media_create_normalizes_type_and_checks_amounts() {
    let (_, dispatcher) = engine();

    let json = run(
        &dispatcher,
        "CREATE_MEDIA",
        json!({"nombre": "Radio Activa", "tipo": "radio", "costo": -5, "alcance": -1}),
    )
    .await;
    assert_eq!(
        json["errors"],
        json!([
            "costo must be greater than or equal to 0",
            "alcance must be greater than or equal to 0"
        ])
    );

    let data = ok(
        &dispatcher,
        "CREATE_MEDIA",
        json!({"nombre": "Canal 13", "tipo": " Television ", "costo": 2500000, "alcance": 900000}),
    )
    .await;
    assert_eq!(data["tipo"], "television");
    assert_eq!(data["estado"], "activo");
    assert_eq!(data["alcance"], 900000);
}

#[tokio::test]
async fn media_provider_must_exist_before_writing() {
    let (store, dispatcher) = engine();

    let json = run(
        &dispatcher,
        "CREATE_MEDIA",
        json!({"nombre": "TV", "tipo": "television", "id_proveedor": 999}),
    )
    .await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(
        json["errors"],
        json!(["id_proveedor 999 does not reference an existing provider"])
    );
    assert_eq!(store.row_count(Table::Media).await, 0);

    let provider = create_provider(&dispatcher, "Mega").await;
    let media = ok(
        &dispatcher,
        "CREATE_MEDIA",
        json!({"nombre": "TV", "tipo": "television", "id_proveedor": provider}),
    )
    .await;
    assert_eq!(media["id_proveedor"], provider);

    let json = run(
        &dispatcher,
        "UPDATE_MEDIA",
        json!({"id": media["id"], "id_proveedor": 999}),
    )
    .await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    let current = ok(&dispatcher, "GET_MEDIA", json!({"id": media["id"]})).await;
    assert_eq!(current["id_proveedor"], provider);
}

#[tokio::test]
async fn media_delete_is_refused_while_plans_use_it() {
    let (store, dispatcher) = engine();
    let media = ok(
        &dispatcher,
        "CREATE_MEDIA",
        json!({"nombre": "Canal 13", "tipo": "television"}),
    )
    .await;
    let id = media["id"].as_i64().unwrap();
    seed(
        &store,
        Table::Plans,
        json!({"nombre": "Plan marzo", "estado": "borrador", "id_medio": id}),
    )
    .await;

    let json = run(&dispatcher, "DELETE_MEDIA", json!({"id": id})).await;
    assert_eq!(json["code"], "HAS_DEPENDENCIES");
    assert_eq!(json["hasPlans"], true);

    ok(&dispatcher, "DELETE_MEDIA", json!({"id": id, "force": true})).await;
    assert_eq!(store.row_count(Table::Media).await, 0);
    assert_eq!(store.row_count(Table::Plans).await, 1);
}

#[tokio::test]
async fn media_search_and_stats() {
    let (_, dispatcher) = engine();
    for (nombre, tipo, costo, alcance) in [
        ("Canal 13", "television", 3000.0, 1000),
        ("Mega", "television", 1000.0, 3000),
        ("ADN", "radio", 500.0, 200),
    ] {
        ok(
            &dispatcher,
            "CREATE_MEDIA",
            json!({"nombre": nombre, "tipo": tipo, "costo": costo, "alcance": alcance}),
        )
        .await;
    }
    ok(&dispatcher, "CHANGE_MEDIA_STATUS", json!({"id": 3, "estado": "archivado"})).await;

    let json = run(
        &dispatcher,
        "SEARCH_MEDIA",
        json!({"tipo": "television", "costo_max": 2000}),
    )
    .await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["data"][0]["nombre"], "Mega");
    assert_eq!(json["message"], "Found 1 media outlets");

    let json = run(&dispatcher, "SEARCH_MEDIA", json!({"tipo": ["radio", "television"]})).await;
    assert_eq!(json["count"], 3);

    let data = ok(&dispatcher, "GET_MEDIA_STATS", json!({})).await;
    assert_eq!(data["total"], 3);
    assert_eq!(data["por_tipo"]["television"], 2);
    assert_eq!(data["por_tipo"]["cine"], 0);
    assert_eq!(data["por_estado"]["archivado"], 1);
    assert_eq!(data["costo_promedio"].as_f64(), Some(1500.0));
    assert_eq!(data["alcance_promedio"].as_f64(), Some(1400.0));
}

#[tokio::test]
async fn media_update_rejects_state_and_unknown_type() {
    let (_, dispatcher) = engine();
    ok(&dispatcher, "CREATE_MEDIA", json!({"nombre": "ADN", "tipo": "radio"})).await;

    let json = run(
        &dispatcher,
        "UPDATE_MEDIA",
        json!({"id": 1, "tipo": "podcast", "estado": "inactivo"}),
    )
    .await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["errors"].as_array().unwrap().len(), 2);

    let data = ok(&dispatcher, "UPDATE_MEDIA", json!({"id": 1, "tipo": "digital"})).await;
    assert_eq!(data["tipo"], "digital");
}

// ---------------------------------------------------------------------------
// Themes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn theme_client_must_exist_before_writing() {
    let (store, dispatcher) = engine();

    let json = run(
        &dispatcher,
        "CREATE_THEME",
        json!({"nombre": "Spot", "id_cliente": 999}),
    )
    .await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(
        json["errors"],
        json!(["id_cliente 999 does not reference an existing client"])
    );
    assert_eq!(store.row_count(Table::Themes).await, 0);

    let theme = create_theme(&dispatcher, "Spot").await;
    let json = run(
        &dispatcher,
        "UPDATE_THEME",
        json!({"id": theme, "id_cliente": 999}),
    )
    .await;
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let client = create_client(&dispatcher, "Acme").await;
    let updated = ok(
        &dispatcher,
        "UPDATE_THEME",
        json!({"id": theme, "id_cliente": client}),
    )
    .await;
    assert_eq!(updated["id_cliente"], client);
}

#[tokio::test]
async fn theme_duration_is_bounded_to_an_hour() {
    let (store, dispatcher) = engine();

    let json = run(
        &dispatcher,
        "CREATE_THEME",
        json!({"nombre": "Spot verano", "duracion": 3601}),
    )
    .await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["errors"], json!(["duracion must be between 0 and 3600"]));
    assert_eq!(store.row_count(Table::Themes).await, 0);

    let data = ok(
        &dispatcher,
        "CREATE_THEME",
        json!({"nombre": "Spot verano", "duracion": 3600}),
    )
    .await;
    assert_eq!(data["duracion"], 3600);
    assert_eq!(data["estado"], "activo");
}

#[tokio::test]
async fn linked_theme_needs_force_and_loses_its_links() {
    let (store, dispatcher) = engine();
    let client = create_client(&dispatcher, "Acme").await;
    let theme = create_theme(&dispatcher, "Spot verano").await;
    let campaign = create_campaign(&dispatcher, client, "Verano").await;
    ok(
        &dispatcher,
        "ADD_CAMPAIGN_THEME",
        json!({"id_campania": campaign, "id_tema": theme}),
    )
    .await;

    let json = run(&dispatcher, "DELETE_THEME", json!({"id": theme})).await;
    assert_eq!(json["code"], "HAS_DEPENDENCIES");
    assert_eq!(json["hasCampaigns"], true);
    assert_eq!(store.row_count(Table::CampaignThemes).await, 1);

    ok(&dispatcher, "DELETE_THEME", json!({"id": theme, "force": true})).await;
    assert_eq!(store.row_count(Table::Themes).await, 0);
    assert_eq!(store.row_count(Table::CampaignThemes).await, 0);

    let json = run(&dispatcher, "GET_CAMPAIGN_THEMES", json!({"id_campania": campaign})).await;
    assert_eq!(json["count"], 0);
    assert_eq!(json["data"], json!([]));
}

#[tokio::test]
async fn theme_stats_sum_production_cost() {
    let (_, dispatcher) = engine();
    for (duracion, costo) in [(30, 1500.5), (60, 2000.25)] {
        ok(
            &dispatcher,
            "CREATE_THEME",
            json!({"nombre": "T", "duracion": duracion, "costo_produccion": costo}),
        )
        .await;
    }
    ok(&dispatcher, "CREATE_THEME", json!({"nombre": "Sin costo"})).await;

    let data = ok(&dispatcher, "GET_THEME_STATS", json!({})).await;
    assert_eq!(data["total"], 3);
    assert_eq!(data["duracion_promedio"].as_f64(), Some(45.0));
    assert_eq!(data["costo_produccion_total"].as_f64(), Some(3500.75));
    assert_eq!(data["costo_produccion_promedio"].as_f64(), Some(1750.38));
}

#[tokio::test]
async fn theme_export_honors_filters() {
    let (_, dispatcher) = engine();
    create_theme(&dispatcher, "Spot verano").await;
    create_theme(&dispatcher, "Spot invierno").await;

    let json = run(&dispatcher, "EXPORT_THEMES", json!({"nombre": "verano"})).await;
    assert_eq!(json["count"], 1);
    let content = json["data"]["content"].as_str().unwrap();
    assert!(content.starts_with("\"ID\",\"Nombre\""));
    assert!(content.contains("\"Spot verano\""));
    assert!(!content.contains("invierno"));
}
