//! Building blocks shared by the domain handlers: allow-listed search
//! queries, CSV export, state changes, dependency checks and the
//! identity/contact fields clients and providers have in common.

use serde::Serialize;
use serde_json::{json, Value};

use mediabuy_core::export::{build_csv, export_filename, ExportColumn, CSV_MIME_TYPE};
use mediabuy_core::search::{resolve_sort_column, Page};
use mediabuy_core::status::StateSet;
use mediabuy_core::types::DbId;
use mediabuy_core::validation::{
    validate_email, validate_max_length, validate_phone, validate_required_text, validate_rut,
    FieldErrors, MAX_NAME_LENGTH, MAX_TEXT_LENGTH,
};
use mediabuy_db::models::Entity;
use mediabuy_db::repositories::EntityRepo;
use mediabuy_db::{FieldValue, Filter, Query, Store, Table};

use crate::config::EngineSettings;
use crate::envelope::{ActionError, ActionResult, Success};
use crate::params::{self, as_date, as_float, as_int, ParamReader, Params};

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// How a filter param's value is typed before it reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Int,
    Float,
    Text,
    /// Stored enum text; matched trimmed and lowercased.
    State,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match {
    /// Equality, or set membership when the param is an array.
    Exact,
    /// Case-insensitive substring.
    Contains,
    Min,
    Max,
}

/// One allow-listed search parameter.
#[derive(Debug, Clone, Copy)]
pub struct SearchField {
    pub param: &'static str,
    pub column: &'static str,
    pub kind: FilterKind,
    pub matching: Match,
}

impl SearchField {
    pub const fn exact(column: &'static str, kind: FilterKind) -> Self {
        Self {
            param: column,
            column,
            kind,
            matching: Match::Exact,
        }
    }

    pub const fn contains(column: &'static str) -> Self {
        Self {
            param: column,
            column,
            kind: FilterKind::Text,
            matching: Match::Contains,
        }
    }

    pub const fn min(param: &'static str, column: &'static str, kind: FilterKind) -> Self {
        Self {
            param,
            column,
            kind,
            matching: Match::Min,
        }
    }

    pub const fn max(param: &'static str, column: &'static str, kind: FilterKind) -> Self {
        Self {
            param,
            column,
            kind,
            matching: Match::Max,
        }
    }
}

/// Filterable and sortable columns of one entity.
#[derive(Debug, Clone, Copy)]
pub struct SearchSpec {
    pub fields: &'static [SearchField],
    pub sortable: &'static [&'static str],
    pub default_sort: &'static str,
    pub default_ascending: bool,
}

fn field_value(kind: FilterKind, value: &Value) -> Option<FieldValue> {
    match kind {
        FilterKind::Int => as_int(value).map(FieldValue::Int),
        FilterKind::Float => as_float(value).map(FieldValue::Float),
        FilterKind::Date => as_date(value).map(FieldValue::Date),
        FilterKind::Text => match value {
            Value::String(s) => Some(FieldValue::Text(s.trim().to_string())),
            Value::Number(n) => Some(FieldValue::Text(n.to_string())),
            _ => None,
        },
        FilterKind::State => value
            .as_str()
            .map(|s| FieldValue::Text(s.trim().to_lowercase())),
    }
}

fn kind_label(kind: FilterKind) -> &'static str {
    match kind {
        FilterKind::Int => "an integer",
        FilterKind::Float => "a number",
        FilterKind::Text | FilterKind::State => "text",
        FilterKind::Date => "a date (YYYY-MM-DD)",
    }
}

/// Translate params into a store query. Params not on the allow-list are
/// ignored; allow-listed params with a value of the wrong type fail.
pub fn build_query(
    spec: &SearchSpec,
    params: &Params,
    default_limit: i64,
    max_limit: i64,
) -> Result<Query, ActionError> {
    let mut query = Query::new();
    let mut errors = FieldErrors::new();

    for field in spec.fields {
        let value = match params.get(field.param) {
            None | Some(Value::Null) => continue,
            Some(Value::String(s)) if s.trim().is_empty() => continue,
            Some(v) => v,
        };
        let type_error = || format!("{} must be {}", field.param, kind_label(field.kind));

        match (field.matching, value) {
            (Match::Exact, Value::Array(items)) => {
                let values: Option<Vec<FieldValue>> =
                    items.iter().map(|v| field_value(field.kind, v)).collect();
                match values {
                    Some(values) => query = query.filter(Filter::In(field.column, values)),
                    None => errors.push(format!(
                        "{} must contain only {} values",
                        field.param,
                        kind_label(field.kind)
                    )),
                }
            }
            (Match::Contains, Value::String(s)) => {
                query = query.filter(Filter::ILike(field.column, s.trim().to_string()));
            }
            (Match::Contains, _) => errors.push(type_error()),
            (matching, value) => match field_value(field.kind, value) {
                Some(v) => {
                    let filter = match matching {
                        Match::Min => Filter::Gte(field.column, v),
                        Match::Max => Filter::Lte(field.column, v),
                        _ => Filter::Eq(field.column, v),
                    };
                    query = query.filter(filter);
                }
                None => errors.push(type_error()),
            },
        }
    }

    let mut reader = ParamReader::new(params);
    let limit = reader.int("limit");
    let offset = reader.int("offset");
    let requested_sort = reader.text("order_by");
    errors.extend_prefixed("", reader.finish());
    errors.into_result()?;

    let sort = resolve_sort_column(requested_sort.as_deref(), spec.sortable, spec.default_sort);
    let ascending = if params::is_present(params, "ascending") {
        params::flag(params, "ascending")
    } else {
        spec.default_ascending
    };

    let page = Page::resolve(limit, offset, default_limit, max_limit);

    Ok(query
        .order_by(sort, ascending)
        .limit(page.limit)
        .offset(page.offset))
}

/// Run an allow-listed search and wrap the rows with their count.
pub async fn search<T: Entity>(
    store: &dyn Store,
    spec: &SearchSpec,
    params: &Params,
    settings: &EngineSettings,
    plural: &str,
) -> ActionResult {
    let query = build_query(spec, params, settings.default_limit, settings.max_limit)?;
    let rows: Vec<T> = EntityRepo::find_many(store, &query).await?;
    let count = rows.len();
    Ok(Success::record(&rows)?
        .with_count(count)
        .with_message(format!("Found {count} {plural}")))
}

/// Re-run the search with the export row cap and render the rows as CSV.
pub async fn export<T: Entity>(
    store: &dyn Store,
    spec: &SearchSpec,
    params: &Params,
    settings: &EngineSettings,
    columns: &[ExportColumn],
    file_stem: &str,
) -> ActionResult {
    let query = build_query(
        spec,
        params,
        settings.export_max_rows,
        settings.export_max_rows,
    )?;
    let rows: Vec<T> = EntityRepo::find_many(store, &query).await?;
    let records = rows.iter().map(to_json).collect::<Result<Vec<_>, _>>()?;
    let count = records.len();

    let filename = export_filename(file_stem, chrono::Local::now().date_naive());
    let content = build_csv(columns, &records);

    tracing::info!(file = %filename, rows = count, "Export generated");
    Ok(Success::new(json!({
        "filename": filename,
        "mime_type": CSV_MIME_TYPE,
        "content": content,
    }))
    .with_count(count)
    .with_message(format!("Exported {count} rows to {filename}")))
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

pub fn to_json<T: Serialize>(value: &T) -> Result<Value, ActionError> {
    Ok(serde_json::to_value(value)?)
}

/// Load a record or fail with `NOT_FOUND`.
pub async fn fetch<T: Entity>(store: &dyn Store, id: DbId) -> Result<T, ActionError> {
    EntityRepo::find_by_id::<T>(store, id)
        .await?
        .ok_or_else(|| ActionError::not_found(T::NAME, id))
}

/// `GET_*` by the `id` param.
pub async fn get_by_id<T: Entity>(store: &dyn Store, params: &Params) -> ActionResult {
    let id = params::require_id(params, "id")?;
    let record: T = fetch(store, id).await?;
    Ok(Success::record(&record)?)
}

/// Read and check the new value of a state column (`estado`, `prioridad`).
///
/// Fails with `INVALID_STATE` before anything is read from the store.
pub fn parse_state<S: StateSet>(params: &Params) -> Result<S, ActionError> {
    let raw = params::text_value(params, S::FIELD).unwrap_or_default();
    S::parse(&raw).ok_or_else(|| ActionError::invalid_state(S::FIELD, &raw, &S::allowed_values()))
}

/// Set a state column to a value already checked by [`parse_state`].
pub async fn apply_state<T: Entity, S: StateSet>(
    store: &dyn Store,
    id: DbId,
    next: S,
) -> ActionResult {
    let current: T = fetch(store, id).await?;
    let previous = to_json(&current)?
        .get(S::FIELD)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let updated: T = EntityRepo::set_field(store, id, S::FIELD, Value::from(next.as_str()))
        .await?
        .ok_or_else(|| ActionError::not_found(T::NAME, id))?;

    tracing::info!(
        entity = T::NAME,
        id,
        field = S::FIELD,
        from = %previous,
        to = next.as_str(),
        "State changed"
    );
    Ok(Success::record(&updated)?.with_message(format!(
        "{} {id} {} changed from {previous} to {}",
        T::NAME,
        S::FIELD,
        next.as_str()
    )))
}

/// `CHANGE_*_STATUS`: validate the value, then apply it.
pub async fn change_state<T: Entity, S: StateSet>(
    store: &dyn Store,
    params: &Params,
) -> ActionResult {
    let id = params::require_id(params, "id")?;
    let next: S = parse_state(params)?;
    apply_state::<T, S>(store, id, next).await
}

/// Rejects `estado` in an update patch; state moves through change-status.
pub fn reject_state_patch(params: &Params, errors: &mut FieldErrors) {
    if params::is_present(params, "estado") {
        errors.push("estado cannot be changed by update; use the change status action");
    }
}

// ---------------------------------------------------------------------------
// Dependencies
// ---------------------------------------------------------------------------

/// A table whose rows reference the record being deleted.
#[derive(Debug, Clone, Copy)]
pub struct DependencyCheck {
    /// Diagnostic key, e.g. `hasOrders`.
    pub flag: &'static str,
    pub table: Table,
    pub column: &'static str,
}

/// Probe each dependent table for at least one row referencing `id`.
pub async fn dependency_flags(
    store: &dyn Store,
    id: DbId,
    checks: &[DependencyCheck],
) -> Result<Vec<(&'static str, bool)>, ActionError> {
    let mut flags = Vec::with_capacity(checks.len());
    for check in checks {
        let present = EntityRepo::exists(store, check.table, Filter::eq(check.column, id)).await?;
        flags.push((check.flag, present));
    }
    Ok(flags)
}

/// Fail with `HAS_DEPENDENCIES` unless forced or no dependents exist.
pub async fn guard_dependencies(
    store: &dyn Store,
    entity: &str,
    id: DbId,
    checks: &[DependencyCheck],
    force: bool,
) -> Result<(), ActionError> {
    if force {
        return Ok(());
    }
    let flags = dependency_flags(store, id, checks).await?;
    if flags.iter().any(|(_, present)| *present) {
        return Err(ActionError::has_dependencies(entity, id, &flags));
    }
    Ok(())
}

/// Delete a record by primary key, reporting `NOT_FOUND` if it vanished.
pub async fn delete_record<T: Entity>(store: &dyn Store, id: DbId) -> Result<(), ActionError> {
    if !EntityRepo::delete::<T>(store, id).await? {
        return Err(ActionError::not_found(T::NAME, id));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Identity and contact fields
// ---------------------------------------------------------------------------

/// Identity and contact fields shared by clients and providers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentityFields {
    pub nombre: Option<String>,
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
}

/// Read and validate identity fields. With `require`, `nombre` and `rut`
/// must be present; otherwise only supplied fields are checked.
pub fn read_identity(reader: &mut ParamReader<'_>, require: bool) -> IdentityFields {
    let fields = IdentityFields {
        nombre: reader.text("nombre"),
        rut: reader.text("rut"),
        razon_social: reader.text("razon_social"),
        giro: reader.text("giro"),
        direccion: reader.text("direccion"),
        ciudad: reader.text("ciudad"),
        region: reader.text("region"),
        telefono: reader.text("telefono"),
        email: reader.text("email").map(|e| e.to_lowercase()),
        contacto: reader.text("contacto"),
        id_agencia: reader.id("id_agencia"),
        observaciones: reader.text("observaciones"),
    };

    let errors = reader.errors_mut();
    if require {
        errors.check(validate_required_text(
            "nombre",
            fields.nombre.as_deref(),
            MAX_NAME_LENGTH,
        ));
        if fields.rut.is_none() {
            errors.push("rut is required");
        }
    } else if let Some(nombre) = &fields.nombre {
        errors.check(validate_max_length("nombre", nombre, MAX_NAME_LENGTH));
    }

    if let Some(rut) = &fields.rut {
        errors.check(validate_rut(rut));
    }
    if let Some(email) = &fields.email {
        errors.check(validate_email(email));
    }
    if let Some(telefono) = &fields.telefono {
        errors.check(validate_phone(telefono));
    }
    for (field, value) in [
        ("razon_social", &fields.razon_social),
        ("giro", &fields.giro),
        ("direccion", &fields.direccion),
        ("ciudad", &fields.ciudad),
        ("region", &fields.region),
        ("contacto", &fields.contacto),
    ] {
        if let Some(v) = value {
            errors.check(validate_max_length(field, v, MAX_NAME_LENGTH));
        }
    }
    if let Some(obs) = &fields.observaciones {
        errors.check(validate_max_length("observaciones", obs, MAX_TEXT_LENGTH));
    }

    fields
}
