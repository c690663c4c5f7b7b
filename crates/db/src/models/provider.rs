//! Provider entity model and DTOs.
//!
//! Providers share the client identity and contact fields and add
//! commercial terms: `comision` (percent) and `dias_pago` (payment days).

use serde::{Deserialize, Serialize};

use mediabuy_core::status::ProviderStatus;
use mediabuy_core::types::{DbId, Timestamp};

use super::Entity;
use crate::store::Table;

/// A row from the `proveedores` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
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
    pub comision: f64,
    pub dias_pago: i64,
    pub estado: ProviderStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Entity for Provider {
    const TABLE: Table = Table::Providers;
    const NAME: &'static str = "Provider";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateProvider {
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
    pub comision: f64,
    pub dias_pago: i64,
    pub estado: ProviderStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateProvider {
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comision: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dias_pago: Option<i64>,
}
