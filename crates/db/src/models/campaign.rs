//! Campaign, campaign–theme association and plan models.

use serde::{Deserialize, Serialize};

use mediabuy_core::status::CampaignStatus;
use mediabuy_core::types::{Date, DbId, Timestamp};

use super::Entity;
use crate::store::Table;

// ---------------------------------------------------------------------------
// Campaign
// ---------------------------------------------------------------------------

/// A row from the `campanias` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: DbId,
    pub nombre: String,
    pub id_cliente: Option<DbId>,
    pub fecha_inicio: Date,
    pub fecha_fin: Date,
    pub presupuesto: Option<f64>,
    pub descripcion: Option<String>,
    pub objetivo: Option<String>,
    pub estado: CampaignStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Entity for Campaign {
    const TABLE: Table = Table::Campaigns;
    const NAME: &'static str = "Campaign";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateCampaign {
    pub nombre: String,
    pub id_cliente: DbId,
    pub fecha_inicio: Date,
    pub fecha_fin: Date,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presupuesto: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objetivo: Option<String>,
    pub estado: CampaignStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateCampaign {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_cliente: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_inicio: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_fin: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presupuesto: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objetivo: Option<String>,
}

// ---------------------------------------------------------------------------
// Campaign–theme association
// ---------------------------------------------------------------------------

/// A row from the `campania_temas` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignTheme {
    pub id: DbId,
    pub id_campania: DbId,
    pub id_tema: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Entity for CampaignTheme {
    const TABLE: Table = Table::CampaignThemes;
    const NAME: &'static str = "Campaign theme";
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CreateCampaignTheme {
    pub id_campania: DbId,
    pub id_tema: DbId,
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// A row from the `planes` table. Read-only from the engine's side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: DbId,
    pub nombre: String,
    pub id_campania: Option<DbId>,
    pub id_medio: Option<DbId>,
    pub fecha_inicio: Option<Date>,
    pub fecha_fin: Option<Date>,
    pub inversion: Option<f64>,
    pub estado: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Entity for Plan {
    const TABLE: Table = Table::Plans;
    const NAME: &'static str = "Plan";
}
