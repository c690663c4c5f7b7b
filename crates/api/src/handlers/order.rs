//! Purchase order actions: numbering, line items and priority.

use std::sync::Arc;

use serde_json::{json, Map, Value};

use mediabuy_core::export::ExportColumn;
use mediabuy_core::order_number::{day_prefix, next_order_number};
use mediabuy_core::stats::{average, count_by_known, round2, sum};
use mediabuy_core::status::{OrderPriority, OrderStatus};
use mediabuy_core::types::{Date, DbId};
use mediabuy_core::validation::{
    validate_max_length, validate_non_negative, validate_positive, validate_required_text,
    FieldErrors, MAX_TEXT_LENGTH,
};
use mediabuy_db::models::campaign::Campaign;
use mediabuy_db::models::client::Client;
use mediabuy_db::models::order::{CreateOrder, CreateOrderDetail, Order, OrderDetail, UpdateOrder};
use mediabuy_db::models::provider::Provider;
use mediabuy_db::repositories::{EntityRepo, OrderDetailRepo, OrderRepo};
use mediabuy_db::Store;

use super::common::{self, FilterKind, SearchField, SearchSpec};
use crate::config::EngineSettings;
use crate::envelope::{ActionError, ActionResult, Success};
use crate::params::{self, ParamReader, Params};

/// An order with details carries the sum of their subtotals as its total.
const TOTAL_FROM_DETAILS: &str =
    "monto_total is computed from detalles and cannot be set while the order has details";

const SEARCH: SearchSpec = SearchSpec {
    fields: &[
        SearchField::contains("numero_orden"),
        SearchField::exact("id_cliente", FilterKind::Int),
        SearchField::exact("id_proveedor", FilterKind::Int),
        SearchField::exact("id_campania", FilterKind::Int),
        SearchField::exact("estado", FilterKind::State),
        SearchField::exact("prioridad", FilterKind::State),
        SearchField::min("fecha_desde", "fecha_emision", FilterKind::Date),
        SearchField::max("fecha_hasta", "fecha_emision", FilterKind::Date),
        SearchField::min("monto_min", "monto_total", FilterKind::Float),
        SearchField::max("monto_max", "monto_total", FilterKind::Float),
    ],
    sortable: &[
        "numero_orden", "fecha_emision", "fecha_entrega", "monto_total", "prioridad", "estado",
        "created_at", "updated_at",
    ],
    default_sort: "numero_orden",
    default_ascending: false,
};

const EXPORT_COLUMNS: &[ExportColumn] = &[
    ExportColumn::new("id", "ID"),
    ExportColumn::new("numero_orden", "Número de Orden"),
    ExportColumn::new("id_cliente", "ID Cliente"),
    ExportColumn::new("id_proveedor", "ID Proveedor"),
    ExportColumn::new("id_campania", "ID Campaña"),
    ExportColumn::new("descripcion", "Descripción"),
    ExportColumn::new("monto_total", "Monto Total"),
    ExportColumn::new("fecha_emision", "Fecha de Emisión"),
    ExportColumn::new("fecha_entrega", "Fecha de Entrega"),
    ExportColumn::new("prioridad", "Prioridad"),
    ExportColumn::new("estado", "Estado"),
    ExportColumn::new("created_at", "Fecha de Creación"),
];

// ---------------------------------------------------------------------------
// Field readers
// ---------------------------------------------------------------------------

/// One validated line item, before it is tied to an order.
#[derive(Debug, Clone, PartialEq)]
struct DetailInput {
    descripcion: String,
    cantidad: f64,
    precio_unitario: f64,
}

impl DetailInput {
    fn subtotal(&self) -> f64 {
        round2(self.cantidad * self.precio_unitario)
    }

    fn into_create(self, id_orden: DbId) -> CreateOrderDetail {
        let subtotal = self.subtotal();
        CreateOrderDetail {
            id_orden,
            descripcion: self.descripcion,
            cantidad: self.cantidad,
            precio_unitario: self.precio_unitario,
            subtotal,
        }
    }
}

fn read_detail(params: &Map<String, Value>) -> (Option<DetailInput>, FieldErrors) {
    let mut reader = ParamReader::new(params);
    let descripcion = reader.text("descripcion");
    let cantidad = reader.float("cantidad");
    let precio_unitario = reader.float("precio_unitario");
    let cantidad_given = reader.has("cantidad");
    let precio_given = reader.has("precio_unitario");

    let errors = reader.errors_mut();
    errors.check(validate_required_text(
        "descripcion",
        descripcion.as_deref(),
        MAX_TEXT_LENGTH,
    ));
    match cantidad {
        Some(c) => errors.check(validate_positive("cantidad", c)),
        None if !cantidad_given => errors.push("cantidad is required"),
        None => {}
    }
    match precio_unitario {
        Some(p) => errors.check(validate_non_negative("precio_unitario", p)),
        None if !precio_given => errors.push("precio_unitario is required"),
        None => {}
    }

    let errors = reader.finish();
    let detail = match (descripcion, cantidad, precio_unitario) {
        (Some(descripcion), Some(cantidad), Some(precio_unitario)) if errors.is_empty() => {
            Some(DetailInput {
                descripcion,
                cantidad,
                precio_unitario,
            })
        }
        _ => None,
    };
    (detail, errors)
}

/// Read `detalles`, reporting each item's errors under `detalles[i].`.
fn read_details(reader: &mut ParamReader<'_>) -> Vec<DetailInput> {
    let Some(items) = reader.array("detalles") else {
        return Vec::new();
    };
    let mut details = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let Some(obj) = item.as_object() else {
            reader
                .errors_mut()
                .push(format!("detalles[{i}] must be an object"));
            continue;
        };
        let (detail, errors) = read_detail(obj);
        reader
            .errors_mut()
            .extend_prefixed(&format!("detalles[{i}]."), errors);
        details.extend(detail);
    }
    details
}

struct OrderFields {
    id_cliente: Option<DbId>,
    id_proveedor: Option<DbId>,
    id_campania: Option<DbId>,
    descripcion: Option<String>,
    monto_total: Option<f64>,
    fecha_emision: Option<Date>,
    fecha_entrega: Option<Date>,
    observaciones: Option<String>,
}

fn read_order(reader: &mut ParamReader<'_>, require: bool) -> OrderFields {
    let missing: Vec<&str> = if require {
        ["id_cliente", "id_proveedor"]
            .into_iter()
            .filter(|key| !reader.has(key))
            .collect()
    } else {
        Vec::new()
    };
    let fields = OrderFields {
        id_cliente: reader.id("id_cliente"),
        id_proveedor: reader.id("id_proveedor"),
        id_campania: reader.id("id_campania"),
        descripcion: reader.text("descripcion"),
        monto_total: reader.float("monto_total"),
        fecha_emision: reader.date("fecha_emision"),
        fecha_entrega: reader.date("fecha_entrega"),
        observaciones: reader.text("observaciones"),
    };

    let errors = reader.errors_mut();
    for key in missing {
        errors.push(format!("{key} is required"));
    }
    if let Some(monto) = fields.monto_total {
        errors.check(validate_non_negative("monto_total", monto));
    }
    if let Some(descripcion) = &fields.descripcion {
        errors.check(validate_max_length("descripcion", descripcion, MAX_TEXT_LENGTH));
    }
    if let Some(obs) = &fields.observaciones {
        errors.check(validate_max_length("observaciones", obs, MAX_TEXT_LENGTH));
    }
    fields
}

fn check_delivery(errors: &mut FieldErrors, emision: Date, entrega: Option<Date>) {
    if let Some(entrega) = entrega {
        if entrega < emision {
            errors.push(format!(
                "fecha_entrega ({entrega}) must be on or after fecha_emision ({emision})"
            ));
        }
    }
}

fn today() -> Date {
    chrono::Local::now().date_naive()
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

pub struct OrderHandler {
    store: Arc<dyn Store>,
    settings: EngineSettings,
}

impl OrderHandler {
    pub fn new(store: Arc<dyn Store>, settings: EngineSettings) -> Self {
        Self { store, settings }
    }

    /// Record an error for each referenced party that does not exist.
    async fn check_references(
        &self,
        errors: &mut FieldErrors,
        fields: &OrderFields,
    ) -> Result<(), ActionError> {
        let store = self.store.as_ref();
        if let Some(id) = fields.id_cliente {
            if EntityRepo::find_by_id::<Client>(store, id).await?.is_none() {
                errors.push(format!("id_cliente {id} does not reference an existing client"));
            }
        }
        if let Some(id) = fields.id_proveedor {
            if EntityRepo::find_by_id::<Provider>(store, id).await?.is_none() {
                errors.push(format!(
                    "id_proveedor {id} does not reference an existing provider"
                ));
            }
        }
        if let Some(id) = fields.id_campania {
            if EntityRepo::find_by_id::<Campaign>(store, id).await?.is_none() {
                errors.push(format!(
                    "id_campania {id} does not reference an existing campaign"
                ));
            }
        }
        Ok(())
    }

    /// Next number for `date`, from the highest one already stored.
    async fn next_number(&self, date: Date) -> Result<String, ActionError> {
        let last =
            OrderRepo::last_number_with_prefix(self.store.as_ref(), &day_prefix(date)).await?;
        Ok(next_order_number(date, last.as_deref())?)
    }

    /// Rewrite `monto_total` as the sum of the order's detail subtotals.
    async fn recompute_total(&self, id_orden: DbId) -> Result<Order, ActionError> {
        let store = self.store.as_ref();
        let details = OrderDetailRepo::list_for_order(store, id_orden).await?;
        let total = sum(&details, |d| d.subtotal);
        EntityRepo::set_field::<Order>(store, id_orden, "monto_total", json!(total))
            .await?
            .ok_or_else(|| ActionError::not_found("Order", id_orden))
    }

    fn with_details(order: &Order, details: &[OrderDetail]) -> Result<Value, ActionError> {
        let mut data = common::to_json(order)?;
        if let Some(obj) = data.as_object_mut() {
            obj.insert("detalles".into(), common::to_json(&details)?);
        }
        Ok(data)
    }

    pub async fn create(&self, params: &Params) -> ActionResult {
        let mut reader = ParamReader::new(params);
        let fields = read_order(&mut reader, true);
        let details = read_details(&mut reader);
        if fields.monto_total.is_some() && !details.is_empty() {
            reader.errors_mut().push(TOTAL_FROM_DETAILS);
        }
        let prioridad = match reader.text("prioridad") {
            Some(raw) => OrderPriority::parse(&raw).unwrap_or_else(|| {
                reader.errors_mut().push(format!(
                    "prioridad must be one of: {}",
                    OrderPriority::allowed_values().join(", ")
                ));
                OrderPriority::default()
            }),
            None => OrderPriority::default(),
        };
        let estado = match reader.text("estado") {
            Some(raw) => OrderStatus::parse(&raw).unwrap_or_else(|| {
                reader.errors_mut().push(format!(
                    "estado must be one of: {}",
                    OrderStatus::allowed_values().join(", ")
                ));
                OrderStatus::default()
            }),
            None => OrderStatus::default(),
        };
        let mut errors = reader.finish();
        let fecha_emision = fields.fecha_emision.unwrap_or_else(today);
        check_delivery(&mut errors, fecha_emision, fields.fecha_entrega);
        errors.into_result()?;

        let mut errors = FieldErrors::new();
        self.check_references(&mut errors, &fields).await?;
        errors.into_result()?;

        let (Some(id_cliente), Some(id_proveedor)) = (fields.id_cliente, fields.id_proveedor)
        else {
            return Err(ActionError::invalid("id_cliente and id_proveedor are required"));
        };
        let monto_total = if details.is_empty() {
            fields.monto_total.unwrap_or(0.0)
        } else {
            sum(&details, DetailInput::subtotal)
        };

        let store = self.store.as_ref();
        let dto = CreateOrder {
            numero_orden: self.next_number(today()).await?,
            id_cliente,
            id_proveedor,
            id_campania: fields.id_campania,
            descripcion: fields.descripcion,
            monto_total,
            fecha_emision,
            fecha_entrega: fields.fecha_entrega,
            prioridad,
            estado,
            observaciones: fields.observaciones,
        };
        let order: Order = EntityRepo::insert(store, &dto).await?;

        let mut stored = Vec::with_capacity(details.len());
        for detail in details {
            stored.push(OrderDetailRepo::create(store, &detail.into_create(order.id)).await?);
        }

        tracing::info!(
            id = order.id,
            numero_orden = %order.numero_orden,
            detalles = stored.len(),
            monto_total = order.monto_total,
            "Order created"
        );
        let message = format!("Order {} created", order.numero_orden);
        Ok(Success::new(Self::with_details(&order, &stored)?).with_message(message))
    }

    pub async fn search(&self, params: &Params) -> ActionResult {
        common::search::<Order>(self.store.as_ref(), &SEARCH, params, &self.settings, "orders")
            .await
    }

    /// The order record plus its `detalles`.
    pub async fn get_by_id(&self, params: &Params) -> ActionResult {
        let id = params::require_id(params, "id")?;
        let store = self.store.as_ref();
        let order: Order = common::fetch(store, id).await?;
        let details = OrderDetailRepo::list_for_order(store, id).await?;
        Ok(Success::new(Self::with_details(&order, &details)?))
    }

    pub async fn update(&self, params: &Params) -> ActionResult {
        let id = params::require_id(params, "id")?;
        let mut reader = ParamReader::new(params);
        let fields = read_order(&mut reader, false);
        common::reject_state_patch(params, reader.errors_mut());
        if params::is_present(params, "prioridad") {
            reader
                .errors_mut()
                .push("prioridad cannot be changed by update; use the change priority action");
        }
        reader.finish().into_result()?;

        let patch = UpdateOrder {
            id_cliente: fields.id_cliente,
            id_proveedor: fields.id_proveedor,
            id_campania: fields.id_campania,
            descripcion: fields.descripcion.clone(),
            monto_total: fields.monto_total,
            fecha_emision: fields.fecha_emision,
            fecha_entrega: fields.fecha_entrega,
            observaciones: fields.observaciones.clone(),
        };
        if patch == UpdateOrder::default() {
            return Err(ActionError::invalid("No fields to update"));
        }

        let store = self.store.as_ref();
        let current: Order = common::fetch(store, id).await?;
        let mut errors = FieldErrors::new();
        check_delivery(
            &mut errors,
            patch.fecha_emision.unwrap_or(current.fecha_emision),
            patch.fecha_entrega.or(current.fecha_entrega),
        );
        if patch.monto_total.is_some()
            && !OrderDetailRepo::list_for_order(store, id).await?.is_empty()
        {
            errors.push(TOTAL_FROM_DETAILS);
        }
        self.check_references(&mut errors, &fields).await?;
        errors.into_result()?;

        let order: Order = EntityRepo::update(store, id, &patch)
            .await?
            .ok_or_else(|| ActionError::not_found("Order", id))?;

        tracing::info!(id, numero_orden = %order.numero_orden, "Order updated");
        let message = format!("Order {} updated", order.numero_orden);
        Ok(Success::record(&order)?.with_message(message))
    }

    pub async fn change_status(&self, params: &Params) -> ActionResult {
        common::change_state::<Order, OrderStatus>(self.store.as_ref(), params).await
    }

    pub async fn change_priority(&self, params: &Params) -> ActionResult {
        let id = params::require_id(params, "id")?;
        let raw = params::text_value(params, "prioridad").unwrap_or_default();
        let next = OrderPriority::parse(&raw).ok_or_else(|| {
            ActionError::invalid_priority(&raw, &OrderPriority::allowed_values())
        })?;
        common::apply_state::<Order, OrderPriority>(self.store.as_ref(), id, next).await
    }

    /// Orders with work underway need `force`; details go first.
    pub async fn delete(&self, params: &Params) -> ActionResult {
        let id = params::require_id(params, "id")?;
        let force = params::flag(params, "force");
        let store = self.store.as_ref();

        let order: Order = common::fetch(store, id).await?;
        if order.estado.blocks_deletion() && !force {
            return Err(ActionError::blocked_by_state(
                format!(
                    "Order {} is {} and cannot be deleted. Use force to delete anyway",
                    order.numero_orden, order.estado
                ),
                order.estado.as_str(),
            ));
        }

        let removed = OrderDetailRepo::delete_for_order(store, id).await?;
        common::delete_record::<Order>(store, id).await?;

        tracing::info!(id, numero_orden = %order.numero_orden, force, detalles = removed, "Order deleted");
        Ok(Success::new(json!({ "id": id, "deleted": true }))
            .with_message(format!("Order {} deleted", order.numero_orden)))
    }

    pub async fn stats(&self, _params: &Params) -> ActionResult {
        let orders: Vec<Order> = EntityRepo::list_all(self.store.as_ref()).await?;
        let by_estado =
            count_by_known(&orders, &OrderStatus::allowed_values(), |o| o.estado.as_str());
        let by_prioridad = count_by_known(&orders, &OrderPriority::allowed_values(), |o| {
            o.prioridad.as_str()
        });

        Ok(Success::new(json!({
            "total": orders.len(),
            "por_estado": by_estado,
            "por_prioridad": by_prioridad,
            "monto_total": sum(&orders, |o| o.monto_total),
            "monto_promedio": average(&orders, |o| o.monto_total),
        })))
    }

    pub async fn export(&self, params: &Params) -> ActionResult {
        common::export::<Order>(
            self.store.as_ref(),
            &SEARCH,
            params,
            &self.settings,
            EXPORT_COLUMNS,
            "ordenes",
        )
        .await
    }

    // -- Line items ---------------------------------------------------------

    pub async fn add_detail(&self, params: &Params) -> ActionResult {
        let id_orden = params::require_id(params, "id_orden")?;
        let (detail, errors) = read_detail(params);
        errors.into_result()?;
        let Some(detail) = detail else {
            return Err(ActionError::invalid("Invalid order detail"));
        };

        let store = self.store.as_ref();
        let _: Order = common::fetch(store, id_orden).await?;
        let stored = OrderDetailRepo::create(store, &detail.into_create(id_orden)).await?;
        let order = self.recompute_total(id_orden).await?;

        tracing::info!(
            id_orden,
            id_detalle = stored.id,
            monto_total = order.monto_total,
            "Order detail added"
        );
        let message = format!(
            "Detail added to order {}; total is now {}",
            order.numero_orden, order.monto_total
        );
        Ok(Success::new(json!({
            "detalle": common::to_json(&stored)?,
            "monto_total": order.monto_total,
        }))
        .with_message(message))
    }

    pub async fn remove_detail(&self, params: &Params) -> ActionResult {
        let id = params::require_id(params, "id")?;
        let store = self.store.as_ref();

        let detail: OrderDetail = common::fetch(store, id).await?;
        common::delete_record::<OrderDetail>(store, id).await?;
        let order = self.recompute_total(detail.id_orden).await?;

        tracing::info!(
            id,
            id_orden = detail.id_orden,
            monto_total = order.monto_total,
            "Order detail removed"
        );
        let message = format!(
            "Detail removed from order {}; total is now {}",
            order.numero_orden, order.monto_total
        );
        Ok(Success::new(json!({
            "id": id,
            "deleted": true,
            "monto_total": order.monto_total,
        }))
        .with_message(message))
    }

    /// Preview today's next number. Nothing is reserved, so a concurrent
    /// create may take it first.
    pub async fn generate_order_number(&self, _params: &Params) -> ActionResult {
        let numero = self.next_number(today()).await?;
        Ok(Success::new(json!({ "numero_orden": numero }))
            .with_message(format!("Next order number is {numero}")))
    }
}
