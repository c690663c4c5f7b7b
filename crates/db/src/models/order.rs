//! Purchase order and order detail models.

use serde::{Deserialize, Serialize};

use mediabuy_core::status::{OrderPriority, OrderStatus};
use mediabuy_core::types::{Date, DbId, Timestamp};

use super::Entity;
use crate::store::Table;

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

/// A row from the `ordenes` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: DbId,
    pub numero_orden: String,
    pub id_cliente: Option<DbId>,
    pub id_proveedor: Option<DbId>,
    pub id_campania: Option<DbId>,
    pub descripcion: Option<String>,
    pub monto_total: f64,
    pub fecha_emision: Date,
    pub fecha_entrega: Option<Date>,
    pub prioridad: OrderPriority,
    pub estado: OrderStatus,
    pub observaciones: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Entity for Order {
    const TABLE: Table = Table::Orders;
    const NAME: &'static str = "Order";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateOrder {
    pub numero_orden: String,
    pub id_cliente: DbId,
    pub id_proveedor: DbId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_campania: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    pub monto_total: f64,
    pub fecha_emision: Date,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_entrega: Option<Date>,
    pub prioridad: OrderPriority,
    pub estado: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
}

/// Patch for an order. State and priority change through their own
/// operations; `monto_total` is also rewritten when details change.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateOrder {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_cliente: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_proveedor: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_campania: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monto_total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_emision: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_entrega: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
}

// ---------------------------------------------------------------------------
// Order detail
// ---------------------------------------------------------------------------

/// A row from the `detalles_orden` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetail {
    pub id: DbId,
    pub id_orden: DbId,
    pub descripcion: String,
    pub cantidad: f64,
    pub precio_unitario: f64,
    pub subtotal: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Entity for OrderDetail {
    const TABLE: Table = Table::OrderDetails;
    const NAME: &'static str = "Order detail";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateOrderDetail {
    pub id_orden: DbId,
    pub descripcion: String,
    pub cantidad: f64,
    pub precio_unitario: f64,
    pub subtotal: f64,
}
