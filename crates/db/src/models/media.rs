//! Media outlet and theme (creative piece) models.

use serde::{Deserialize, Serialize};

use mediabuy_core::status::{MediaStatus, MediaType, ThemeStatus};
use mediabuy_core::types::{DbId, Timestamp};

use super::Entity;
use crate::store::Table;

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

/// A row from the `medios` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub id: DbId,
    pub nombre: String,
    pub tipo: MediaType,
    pub id_proveedor: Option<DbId>,
    pub costo: Option<f64>,
    pub alcance: Option<i64>,
    pub frecuencia: Option<i64>,
    pub descripcion: Option<String>,
    pub estado: MediaStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Entity for Media {
    const TABLE: Table = Table::Media;
    const NAME: &'static str = "Media";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateMedia {
    pub nombre: String,
    pub tipo: MediaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_proveedor: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub costo: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alcance: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frecuencia: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    pub estado: MediaStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateMedia {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipo: Option<MediaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_proveedor: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub costo: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alcance: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frecuencia: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
}

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

/// A row from the `temas` table. `duracion` is in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub id: DbId,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub id_cliente: Option<DbId>,
    pub costo_produccion: Option<f64>,
    pub duracion: Option<i64>,
    pub estado: ThemeStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Entity for Theme {
    const TABLE: Table = Table::Themes;
    const NAME: &'static str = "Theme";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateTheme {
    pub nombre: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_cliente: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub costo_produccion: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duracion: Option<i64>,
    pub estado: ThemeStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateTheme {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_cliente: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub costo_produccion: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duracion: Option<i64>,
}
