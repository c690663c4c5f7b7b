//! Provider actions.

use std::sync::Arc;

use serde_json::json;

use mediabuy_core::export::ExportColumn;
use mediabuy_core::stats::{average, count_by_known};
use mediabuy_core::status::ProviderStatus;
use mediabuy_core::validation::{
    validate_range, MAX_COMMISSION, MAX_PAYMENT_DAYS, MIN_COMMISSION, MIN_PAYMENT_DAYS,
};
use mediabuy_db::models::provider::{CreateProvider, Provider, UpdateProvider};
use mediabuy_db::repositories::EntityRepo;
use mediabuy_db::{Store, Table};

use super::common::{
    self, read_identity, DependencyCheck, FilterKind, SearchField, SearchSpec,
};
use crate::config::EngineSettings;
use crate::envelope::{ActionError, ActionResult, Success};
use crate::params::{self, ParamReader, Params};

/// Commission applied when none is given, in percent.
const DEFAULT_COMMISSION: f64 = 0.0;

/// Payment terms applied when none are given, in days.
const DEFAULT_PAYMENT_DAYS: i64 = 30;

const SEARCH: SearchSpec = SearchSpec {
    fields: &[
        SearchField::contains("nombre"),
        SearchField::contains("razon_social"),
        SearchField::exact("rut", FilterKind::Text),
        SearchField::contains("ciudad"),
        SearchField::contains("region"),
        SearchField::exact("estado", FilterKind::State),
        SearchField::min("comision_min", "comision", FilterKind::Float),
        SearchField::max("comision_max", "comision", FilterKind::Float),
        SearchField::min("dias_pago_min", "dias_pago", FilterKind::Int),
        SearchField::max("dias_pago_max", "dias_pago", FilterKind::Int),
    ],
    sortable: &[
        "nombre", "rut", "razon_social", "ciudad", "comision", "dias_pago", "estado",
        "created_at", "updated_at",
    ],
    default_sort: "nombre",
    default_ascending: true,
};

const EXPORT_COLUMNS: &[ExportColumn] = &[
    ExportColumn::new("id", "ID"),
    ExportColumn::new("nombre", "Nombre"),
    ExportColumn::new("rut", "RUT"),
    ExportColumn::new("razon_social", "Razón Social"),
    ExportColumn::new("giro", "Giro"),
    ExportColumn::new("direccion", "Dirección"),
    ExportColumn::new("ciudad", "Ciudad"),
    ExportColumn::new("region", "Región"),
    ExportColumn::new("telefono", "Teléfono"),
    ExportColumn::new("email", "Email"),
    ExportColumn::new("contacto", "Contacto"),
    ExportColumn::new("comision", "Comisión (%)"),
    ExportColumn::new("dias_pago", "Días de Pago"),
    ExportColumn::new("estado", "Estado"),
    ExportColumn::new("created_at", "Fecha de Creación"),
];

const DEPENDENTS: &[DependencyCheck] = &[DependencyCheck {
    flag: "hasOrders",
    table: Table::Orders,
    column: "id_proveedor",
}];

pub struct ProviderHandler {
    store: Arc<dyn Store>,
    settings: EngineSettings,
}

/// Commercial terms read from params; `None` when not supplied.
struct Terms {
    comision: Option<f64>,
    dias_pago: Option<i64>,
}

fn read_terms(reader: &mut ParamReader<'_>) -> Terms {
    let terms = Terms {
        comision: reader.float("comision"),
        dias_pago: reader.int("dias_pago"),
    };
    let errors = reader.errors_mut();
    if let Some(c) = terms.comision {
        errors.check(validate_range("comision", c, MIN_COMMISSION, MAX_COMMISSION));
    }
    if let Some(d) = terms.dias_pago {
        errors.check(validate_range(
            "dias_pago",
            d as f64,
            MIN_PAYMENT_DAYS as f64,
            MAX_PAYMENT_DAYS as f64,
        ));
    }
    terms
}

impl ProviderHandler {
    pub fn new(store: Arc<dyn Store>, settings: EngineSettings) -> Self {
        Self { store, settings }
    }

    pub async fn create(&self, params: &Params) -> ActionResult {
        let mut reader = ParamReader::new(params);
        let identity = read_identity(&mut reader, true);
        let terms = read_terms(&mut reader);
        let estado = match params::text_value(params, "estado") {
            Some(raw) => ProviderStatus::parse(&raw).unwrap_or_else(|| {
                reader.errors_mut().push(format!(
                    "estado must be one of: {}",
                    ProviderStatus::allowed_values().join(", ")
                ));
                ProviderStatus::default()
            }),
            None => ProviderStatus::default(),
        };
        reader.finish().into_result()?;

        let dto = CreateProvider {
            nombre: identity.nombre.unwrap_or_default(),
            rut: identity.rut,
            razon_social: identity.razon_social,
            giro: identity.giro,
            direccion: identity.direccion,
            ciudad: identity.ciudad,
            region: identity.region,
            telefono: identity.telefono,
            email: identity.email,
            contacto: identity.contacto,
            id_agencia: identity.id_agencia,
            observaciones: identity.observaciones,
            comision: terms.comision.unwrap_or(DEFAULT_COMMISSION),
            dias_pago: terms.dias_pago.unwrap_or(DEFAULT_PAYMENT_DAYS),
            estado,
        };
        let provider: Provider = EntityRepo::insert(self.store.as_ref(), &dto).await?;

        tracing::info!(id = provider.id, nombre = %provider.nombre, "Provider created");
        let message = format!(
            "Provider '{}' created with id {}",
            provider.nombre, provider.id
        );
        Ok(Success::record(&provider)?.with_message(message))
    }

    pub async fn search(&self, params: &Params) -> ActionResult {
        common::search::<Provider>(
            self.store.as_ref(),
            &SEARCH,
            params,
            &self.settings,
            "providers",
        )
        .await
    }

    pub async fn get_by_id(&self, params: &Params) -> ActionResult {
        common::get_by_id::<Provider>(self.store.as_ref(), params).await
    }

    pub async fn update(&self, params: &Params) -> ActionResult {
        let id = params::require_id(params, "id")?;
        let mut reader = ParamReader::new(params);
        let identity = read_identity(&mut reader, false);
        let terms = read_terms(&mut reader);
        common::reject_state_patch(params, reader.errors_mut());
        reader.finish().into_result()?;

        let patch = UpdateProvider {
            nombre: identity.nombre,
            rut: identity.rut,
            razon_social: identity.razon_social,
            giro: identity.giro,
            direccion: identity.direccion,
            ciudad: identity.ciudad,
            region: identity.region,
            telefono: identity.telefono,
            email: identity.email,
            contacto: identity.contacto,
            id_agencia: identity.id_agencia,
            observaciones: identity.observaciones,
            comision: terms.comision,
            dias_pago: terms.dias_pago,
        };
        if patch == UpdateProvider::default() {
            return Err(ActionError::invalid("No fields to update"));
        }

        let provider: Provider = EntityRepo::update(self.store.as_ref(), id, &patch)
            .await?
            .ok_or_else(|| ActionError::not_found("Provider", id))?;

        tracing::info!(id, "Provider updated");
        Ok(Success::record(&provider)?.with_message(format!("Provider {id} updated")))
    }

    pub async fn change_status(&self, params: &Params) -> ActionResult {
        common::change_state::<Provider, ProviderStatus>(self.store.as_ref(), params).await
    }

    pub async fn delete(&self, params: &Params) -> ActionResult {
        let id = params::require_id(params, "id")?;
        let force = params::flag(params, "force");
        let store = self.store.as_ref();

        let provider: Provider = common::fetch(store, id).await?;
        common::guard_dependencies(store, "Provider", id, DEPENDENTS, force).await?;
        common::delete_record::<Provider>(store, id).await?;

        tracing::info!(id, force, "Provider deleted");
        Ok(Success::new(json!({ "id": id, "deleted": true }))
            .with_message(format!("Provider '{}' deleted", provider.nombre)))
    }

    pub async fn stats(&self, _params: &Params) -> ActionResult {
        let providers: Vec<Provider> = EntityRepo::list_all(self.store.as_ref()).await?;
        let by_estado = count_by_known(&providers, &ProviderStatus::allowed_values(), |p| {
            p.estado.as_str()
        });

        Ok(Success::new(json!({
            "total": providers.len(),
            "por_estado": by_estado,
            "comision_promedio": average(&providers, |p| p.comision),
            "dias_pago_promedio": average(&providers, |p| p.dias_pago as f64),
        })))
    }

    pub async fn export(&self, params: &Params) -> ActionResult {
        common::export::<Provider>(
            self.store.as_ref(),
            &SEARCH,
            params,
            &self.settings,
            EXPORT_COLUMNS,
            "proveedores",
        )
        .await
    }
}
