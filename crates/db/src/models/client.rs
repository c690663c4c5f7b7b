//! Client entity model and DTOs.

use serde::{Deserialize, Serialize};

use mediabuy_core::status::ClientStatus;
use mediabuy_core::types::{DbId, Timestamp};

use super::Entity;
use crate::store::Table;

/// A row from the `clientes` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: DbId,
    pub nombre: String,
    pub rut: Option<String>,
    pub razon_social: Option<String>,
    pub giro: Option<String>,
    pub direccion: Option<String>,
    pub ciudad: Option<String>,
    pub region: Option<String>,
    pub telefono: Option<String>,
    pub email: Option<String>,
    pub contacto: Option<String>,
    pub id_agencia: Option<DbId>,
    pub observaciones: Option<String>,
    pub estado: ClientStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Entity for Client {
    const TABLE: Table = Table::Clients;
    const NAME: &'static str = "Client";
}

/// DTO for creating a client.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateClient {
    pub nombre: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rut: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub razon_social: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub giro: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direccion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ciudad: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contacto: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_agencia: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
    pub estado: ClientStatus,
}

/// DTO for patching a client. All fields optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateClient {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rut: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub razon_social: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub giro: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direccion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ciudad: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contacto: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_agencia: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
}
