//! Client actions.

use std::sync::Arc;

use serde_json::json;

use mediabuy_core::export::ExportColumn;
use mediabuy_core::stats::count_by_known;
use mediabuy_core::status::ClientStatus;
use mediabuy_db::models::client::{Client, CreateClient, UpdateClient};
use mediabuy_db::repositories::EntityRepo;
use mediabuy_db::{Store, Table};

use super::common::{
    self, read_identity, DependencyCheck, FilterKind, SearchField, SearchSpec,
};
use crate::config::EngineSettings;
use crate::envelope::{ActionError, ActionResult, Success};
use crate::params::{self, ParamReader, Params};

const SEARCH: SearchSpec = SearchSpec {
    fields: &[
        SearchField::contains("nombre"),
        SearchField::contains("razon_social"),
        SearchField::exact("rut", FilterKind::Text),
        SearchField::contains("ciudad"),
        SearchField::contains("region"),
        SearchField::contains("email"),
        SearchField::exact("estado", FilterKind::State),
        SearchField::exact("id_agencia", FilterKind::Int),
    ],
    sortable: &["nombre", "rut", "razon_social", "ciudad", "estado", "created_at", "updated_at"],
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
    ExportColumn::new("estado", "Estado"),
    ExportColumn::new("created_at", "Fecha de Creación"),
];

const DEPENDENTS: &[DependencyCheck] = &[
    DependencyCheck {
        flag: "hasCampaigns",
        table: Table::Campaigns,
        column: "id_cliente",
    },
    DependencyCheck {
        flag: "hasOrders",
        table: Table::Orders,
        column: "id_cliente",
    },
];

pub struct ClientHandler {
    store: Arc<dyn Store>,
    settings: EngineSettings,
}

impl ClientHandler {
    pub fn new(store: Arc<dyn Store>, settings: EngineSettings) -> Self {
        Self { store, settings }
    }

    pub async fn create(&self, params: &Params) -> ActionResult {
        let mut reader = ParamReader::new(params);
        let identity = read_identity(&mut reader, true);
        let estado = match params::text_value(params, "estado") {
            Some(raw) => match ClientStatus::parse(&raw) {
                Some(s) => s,
                None => {
                    reader.errors_mut().push(format!(
                        "estado must be one of: {}",
                        ClientStatus::allowed_values().join(", ")
                    ));
                    ClientStatus::default()
                }
            },
            None => ClientStatus::default(),
        };
        reader.finish().into_result()?;

        let dto = CreateClient {
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
            estado,
        };
        let client: Client = EntityRepo::insert(self.store.as_ref(), &dto).await?;

        tracing::info!(id = client.id, nombre = %client.nombre, "Client created");
        let message = format!("Client '{}' created with id {}", client.nombre, client.id);
        Ok(Success::record(&client)?.with_message(message))
    }

    pub async fn search(&self, params: &Params) -> ActionResult {
        common::search::<Client>(self.store.as_ref(), &SEARCH, params, &self.settings, "clients")
            .await
    }

    pub async fn get_by_id(&self, params: &Params) -> ActionResult {
        common::get_by_id::<Client>(self.store.as_ref(), params).await
    }

    pub async fn update(&self, params: &Params) -> ActionResult {
        let id = params::require_id(params, "id")?;
        let mut reader = ParamReader::new(params);
        let identity = read_identity(&mut reader, false);
        common::reject_state_patch(params, reader.errors_mut());
        reader.finish().into_result()?;

        let patch = UpdateClient {
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
        };
        if patch == UpdateClient::default() {
            return Err(ActionError::invalid("No fields to update"));
        }

        let client: Client = EntityRepo::update(self.store.as_ref(), id, &patch)
            .await?
            .ok_or_else(|| ActionError::not_found("Client", id))?;

        tracing::info!(id, "Client updated");
        Ok(Success::record(&client)?.with_message(format!("Client {id} updated")))
    }

    pub async fn change_status(&self, params: &Params) -> ActionResult {
        common::change_state::<Client, ClientStatus>(self.store.as_ref(), params).await
    }

    pub async fn delete(&self, params: &Params) -> ActionResult {
        let id = params::require_id(params, "id")?;
        let force = params::flag(params, "force");
        let store = self.store.as_ref();

        let client: Client = common::fetch(store, id).await?;
        common::guard_dependencies(store, "Client", id, DEPENDENTS, force).await?;
        common::delete_record::<Client>(store, id).await?;

        tracing::info!(id, force, "Client deleted");
        Ok(Success::new(json!({ "id": id, "deleted": true }))
            .with_message(format!("Client '{}' deleted", client.nombre)))
    }

    pub async fn stats(&self, _params: &Params) -> ActionResult {
        let clients: Vec<Client> = EntityRepo::list_all(self.store.as_ref()).await?;
        let by_estado = count_by_known(&clients, &ClientStatus::allowed_values(), |c| {
            c.estado.as_str()
        });
        let with_email = clients.iter().filter(|c| c.email.is_some()).count();

        Ok(Success::new(json!({
            "total": clients.len(),
            "por_estado": by_estado,
            "con_email": with_email,
        })))
    }

    pub async fn export(&self, params: &Params) -> ActionResult {
        common::export::<Client>(
            self.store.as_ref(),
            &SEARCH,
            params,
            &self.settings,
            EXPORT_COLUMNS,
            "clientes",
        )
        .await
    }
}
