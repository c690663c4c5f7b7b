//! Media outlet and theme actions.
//!
//! One handler serves both catalogs: media outlets (`medios`), which plans
//! buy slots on, and themes (`temas`), the creative pieces campaigns run.

use std::sync::Arc;

use serde_json::json;

use mediabuy_core::export::ExportColumn;
use mediabuy_core::stats::{average, count_by_known, sum};
use mediabuy_core::status::{MediaStatus, MediaType, StateSet, ThemeStatus};
use mediabuy_core::types::DbId;
use mediabuy_core::validation::{
    validate_max_length, validate_non_negative, validate_range, validate_required_text,
    FieldErrors, MAX_NAME_LENGTH, MAX_TEXT_LENGTH, MAX_THEME_DURATION, MIN_THEME_DURATION,
};
use mediabuy_db::models::client::Client;
use mediabuy_db::models::media::{
    CreateMedia, CreateTheme, Media, Theme, UpdateMedia, UpdateTheme,
};
use mediabuy_db::models::provider::Provider;
use mediabuy_db::repositories::{CampaignThemeRepo, EntityRepo};
use mediabuy_db::{Store, Table};

use super::common::{self, DependencyCheck, FilterKind, SearchField, SearchSpec};
use crate::config::EngineSettings;
use crate::envelope::{ActionError, ActionResult, Success};
use crate::params::{self, ParamReader, Params};

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

const MEDIA_SEARCH: SearchSpec = SearchSpec {
    fields: &[
        SearchField::contains("nombre"),
        SearchField::exact("tipo", FilterKind::State),
        SearchField::exact("estado", FilterKind::State),
        SearchField::exact("id_proveedor", FilterKind::Int),
        SearchField::min("costo_min", "costo", FilterKind::Float),
        SearchField::max("costo_max", "costo", FilterKind::Float),
        SearchField::min("alcance_min", "alcance", FilterKind::Int),
        SearchField::max("alcance_max", "alcance", FilterKind::Int),
    ],
    sortable: &[
        "nombre", "tipo", "costo", "alcance", "frecuencia", "estado", "created_at", "updated_at",
    ],
    default_sort: "nombre",
    default_ascending: true,
};

const MEDIA_EXPORT_COLUMNS: &[ExportColumn] = &[
    ExportColumn::new("id", "ID"),
    ExportColumn::new("nombre", "Nombre"),
    ExportColumn::new("tipo", "Tipo"),
    ExportColumn::new("id_proveedor", "ID Proveedor"),
    ExportColumn::new("costo", "Costo"),
    ExportColumn::new("alcance", "Alcance"),
    ExportColumn::new("frecuencia", "Frecuencia"),
    ExportColumn::new("descripcion", "Descripción"),
    ExportColumn::new("estado", "Estado"),
    ExportColumn::new("created_at", "Fecha de Creación"),
];

const MEDIA_DEPENDENTS: &[DependencyCheck] = &[DependencyCheck {
    flag: "hasPlans",
    table: Table::Plans,
    column: "id_medio",
}];

const THEME_SEARCH: SearchSpec = SearchSpec {
    fields: &[
        SearchField::contains("nombre"),
        SearchField::exact("estado", FilterKind::State),
        SearchField::exact("id_cliente", FilterKind::Int),
        SearchField::min("duracion_min", "duracion", FilterKind::Int),
        SearchField::max("duracion_max", "duracion", FilterKind::Int),
    ],
    sortable: &[
        "nombre", "duracion", "costo_produccion", "estado", "created_at", "updated_at",
    ],
    default_sort: "nombre",
    default_ascending: true,
};

const THEME_EXPORT_COLUMNS: &[ExportColumn] = &[
    ExportColumn::new("id", "ID"),
    ExportColumn::new("nombre", "Nombre"),
    ExportColumn::new("descripcion", "Descripción"),
    ExportColumn::new("id_cliente", "ID Cliente"),
    ExportColumn::new("duracion", "Duración (s)"),
    ExportColumn::new("costo_produccion", "Costo de Producción"),
    ExportColumn::new("estado", "Estado"),
    ExportColumn::new("created_at", "Fecha de Creación"),
];

const THEME_DEPENDENTS: &[DependencyCheck] = &[DependencyCheck {
    flag: "hasCampaigns",
    table: Table::CampaignThemes,
    column: "id_tema",
}];

// ---------------------------------------------------------------------------
// Field readers
// ---------------------------------------------------------------------------

/// Parse an enum-valued field, recording a validation error when the value
/// is outside the set. Returns `None` when absent or invalid.
fn read_enum<S: StateSet>(reader: &mut ParamReader<'_>, key: &str) -> Option<S> {
    let raw = reader.text(key)?;
    let parsed = S::parse(&raw);
    if parsed.is_none() {
        reader.errors_mut().push(format!(
            "{key} must be one of: {}",
            S::allowed_values().join(", ")
        ));
    }
    parsed
}

fn check_common_text(errors: &mut FieldErrors, nombre: Option<&str>, descripcion: Option<&str>) {
    if let Some(nombre) = nombre {
        errors.check(validate_max_length("nombre", nombre, MAX_NAME_LENGTH));
    }
    if let Some(descripcion) = descripcion {
        errors.check(validate_max_length("descripcion", descripcion, MAX_TEXT_LENGTH));
    }
}

struct MediaFields {
    nombre: Option<String>,
    tipo: Option<MediaType>,
    id_proveedor: Option<i64>,
    costo: Option<f64>,
    alcance: Option<i64>,
    frecuencia: Option<i64>,
    descripcion: Option<String>,
}

fn read_media(reader: &mut ParamReader<'_>, require: bool) -> MediaFields {
    let tipo_given = reader.has("tipo");
    let fields = MediaFields {
        nombre: reader.text("nombre"),
        tipo: read_enum::<MediaType>(reader, "tipo"),
        id_proveedor: reader.id("id_proveedor"),
        costo: reader.float("costo"),
        alcance: reader.int("alcance"),
        frecuencia: reader.int("frecuencia"),
        descripcion: reader.text("descripcion"),
    };

    let errors = reader.errors_mut();
    if require {
        errors.check(validate_required_text(
            "nombre",
            fields.nombre.as_deref(),
            MAX_NAME_LENGTH,
        ));
        if !tipo_given {
            errors.push("tipo is required");
        }
    }
    check_common_text(errors, fields.nombre.as_deref(), fields.descripcion.as_deref());
    if let Some(costo) = fields.costo {
        errors.check(validate_non_negative("costo", costo));
    }
    if let Some(alcance) = fields.alcance {
        errors.check(validate_non_negative("alcance", alcance as f64));
    }
    if let Some(frecuencia) = fields.frecuencia {
        errors.check(validate_non_negative("frecuencia", frecuencia as f64));
    }
    fields
}

struct ThemeFields {
    nombre: Option<String>,
    descripcion: Option<String>,
    id_cliente: Option<i64>,
    costo_produccion: Option<f64>,
    duracion: Option<i64>,
}

fn read_theme(reader: &mut ParamReader<'_>, require: bool) -> ThemeFields {
    let fields = ThemeFields {
        nombre: reader.text("nombre"),
        descripcion: reader.text("descripcion"),
        id_cliente: reader.id("id_cliente"),
        costo_produccion: reader.float("costo_produccion"),
        duracion: reader.int("duracion"),
    };

    let errors = reader.errors_mut();
    if require {
        errors.check(validate_required_text(
            "nombre",
            fields.nombre.as_deref(),
            MAX_NAME_LENGTH,
        ));
    }
    check_common_text(errors, fields.nombre.as_deref(), fields.descripcion.as_deref());
    if let Some(costo) = fields.costo_produccion {
        errors.check(validate_non_negative("costo_produccion", costo));
    }
    if let Some(duracion) = fields.duracion {
        errors.check(validate_range(
            "duracion",
            duracion as f64,
            MIN_THEME_DURATION as f64,
            MAX_THEME_DURATION as f64,
        ));
    }
    fields
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

pub struct MediaHandler {
    store: Arc<dyn Store>,
    settings: EngineSettings,
}

impl MediaHandler {
    pub fn new(store: Arc<dyn Store>, settings: EngineSettings) -> Self {
        Self { store, settings }
    }

    /// Fail with a validation error when the supplied provider or client id
    /// has no row. Runs before any write.
    async fn check_references(
        &self,
        id_proveedor: Option<DbId>,
        id_cliente: Option<DbId>,
    ) -> Result<(), ActionError> {
        let store = self.store.as_ref();
        let mut errors = FieldErrors::new();
        if let Some(id) = id_proveedor {
            if EntityRepo::find_by_id::<Provider>(store, id).await?.is_none() {
                errors.push(format!("id_proveedor {id} does not reference an existing provider"));
            }
        }
        if let Some(id) = id_cliente {
            if EntityRepo::find_by_id::<Client>(store, id).await?.is_none() {
                errors.push(format!("id_cliente {id} does not reference an existing client"));
            }
        }
        errors.into_result()?;
        Ok(())
    }

    // -- Media --------------------------------------------------------------

    pub async fn create_media(&self, params: &Params) -> ActionResult {
        let mut reader = ParamReader::new(params);
        let fields = read_media(&mut reader, true);
        let estado = read_enum::<MediaStatus>(&mut reader, "estado").unwrap_or_default();
        reader.finish().into_result()?;
        self.check_references(fields.id_proveedor, None).await?;

        let (Some(nombre), Some(tipo)) = (fields.nombre, fields.tipo) else {
            return Err(ActionError::invalid("nombre and tipo are required"));
        };
        let dto = CreateMedia {
            nombre,
            tipo,
            id_proveedor: fields.id_proveedor,
            costo: fields.costo,
            alcance: fields.alcance,
            frecuencia: fields.frecuencia,
            descripcion: fields.descripcion,
            estado,
        };
        let media: Media = EntityRepo::insert(self.store.as_ref(), &dto).await?;

        tracing::info!(id = media.id, nombre = %media.nombre, tipo = %media.tipo, "Media created");
        let message = format!("Media '{}' created with id {}", media.nombre, media.id);
        Ok(Success::record(&media)?.with_message(message))
    }

    pub async fn search_media(&self, params: &Params) -> ActionResult {
        common::search::<Media>(
            self.store.as_ref(),
            &MEDIA_SEARCH,
            params,
            &self.settings,
            "media outlets",
        )
        .await
    }

    pub async fn get_media(&self, params: &Params) -> ActionResult {
        common::get_by_id::<Media>(self.store.as_ref(), params).await
    }

    pub async fn update_media(&self, params: &Params) -> ActionResult {
        let id = params::require_id(params, "id")?;
        let mut reader = ParamReader::new(params);
        let fields = read_media(&mut reader, false);
        common::reject_state_patch(params, reader.errors_mut());
        reader.finish().into_result()?;
        self.check_references(fields.id_proveedor, None).await?;

        let patch = UpdateMedia {
            nombre: fields.nombre,
            tipo: fields.tipo,
            id_proveedor: fields.id_proveedor,
            costo: fields.costo,
            alcance: fields.alcance,
            frecuencia: fields.frecuencia,
            descripcion: fields.descripcion,
        };
        if patch == UpdateMedia::default() {
            return Err(ActionError::invalid("No fields to update"));
        }

        let media: Media = EntityRepo::update(self.store.as_ref(), id, &patch)
            .await?
            .ok_or_else(|| ActionError::not_found("Media", id))?;

        tracing::info!(id, "Media updated");
        Ok(Success::record(&media)?.with_message(format!("Media {id} updated")))
    }

    pub async fn change_media_status(&self, params: &Params) -> ActionResult {
        common::change_state::<Media, MediaStatus>(self.store.as_ref(), params).await
    }

    pub async fn delete_media(&self, params: &Params) -> ActionResult {
        let id = params::require_id(params, "id")?;
        let force = params::flag(params, "force");
        let store = self.store.as_ref();

        let media: Media = common::fetch(store, id).await?;
        common::guard_dependencies(store, "Media", id, MEDIA_DEPENDENTS, force).await?;
        common::delete_record::<Media>(store, id).await?;

        tracing::info!(id, force, "Media deleted");
        Ok(Success::new(json!({ "id": id, "deleted": true }))
            .with_message(format!("Media '{}' deleted", media.nombre)))
    }

    pub async fn media_stats(&self, _params: &Params) -> ActionResult {
        let media: Vec<Media> = EntityRepo::list_all(self.store.as_ref()).await?;
        let by_estado =
            count_by_known(&media, &MediaStatus::allowed_values(), |m| m.estado.as_str());
        let by_tipo = count_by_known(&media, &MediaType::allowed_values(), |m| m.tipo.as_str());
        let costs: Vec<f64> = media.iter().filter_map(|m| m.costo).collect();
        let reach: Vec<f64> = media.iter().filter_map(|m| m.alcance).map(|a| a as f64).collect();

        Ok(Success::new(json!({
            "total": media.len(),
            "por_estado": by_estado,
            "por_tipo": by_tipo,
            "costo_promedio": average(&costs, |c| *c),
            "alcance_promedio": average(&reach, |a| *a),
        })))
    }

    pub async fn export_media(&self, params: &Params) -> ActionResult {
        common::export::<Media>(
            self.store.as_ref(),
            &MEDIA_SEARCH,
            params,
            &self.settings,
            MEDIA_EXPORT_COLUMNS,
            "medios",
        )
        .await
    }

    // -- Themes -------------------------------------------------------------

    pub async fn create_theme(&self, params: &Params) -> ActionResult {
        let mut reader = ParamReader::new(params);
        let fields = read_theme(&mut reader, true);
        let estado = read_enum::<ThemeStatus>(&mut reader, "estado").unwrap_or_default();
        reader.finish().into_result()?;
        self.check_references(None, fields.id_cliente).await?;

        let dto = CreateTheme {
            nombre: fields.nombre.unwrap_or_default(),
            descripcion: fields.descripcion,
            id_cliente: fields.id_cliente,
            costo_produccion: fields.costo_produccion,
            duracion: fields.duracion,
            estado,
        };
        let theme: Theme = EntityRepo::insert(self.store.as_ref(), &dto).await?;

        tracing::info!(id = theme.id, nombre = %theme.nombre, "Theme created");
        let message = format!("Theme '{}' created with id {}", theme.nombre, theme.id);
        Ok(Success::record(&theme)?.with_message(message))
    }

    pub async fn search_themes(&self, params: &Params) -> ActionResult {
        common::search::<Theme>(
            self.store.as_ref(),
            &THEME_SEARCH,
            params,
            &self.settings,
            "themes",
        )
        .await
    }

    pub async fn get_theme(&self, params: &Params) -> ActionResult {
        common::get_by_id::<Theme>(self.store.as_ref(), params).await
    }

    pub async fn update_theme(&self, params: &Params) -> ActionResult {
        let id = params::require_id(params, "id")?;
        let mut reader = ParamReader::new(params);
        let fields = read_theme(&mut reader, false);
        common::reject_state_patch(params, reader.errors_mut());
        reader.finish().into_result()?;
        self.check_references(None, fields.id_cliente).await?;

        let patch = UpdateTheme {
            nombre: fields.nombre,
            descripcion: fields.descripcion,
            id_cliente: fields.id_cliente,
            costo_produccion: fields.costo_produccion,
            duracion: fields.duracion,
        };
        if patch == UpdateTheme::default() {
            return Err(ActionError::invalid("No fields to update"));
        }

        let theme: Theme = EntityRepo::update(self.store.as_ref(), id, &patch)
            .await?
            .ok_or_else(|| ActionError::not_found("Theme", id))?;

        tracing::info!(id, "Theme updated");
        Ok(Success::record(&theme)?.with_message(format!("Theme {id} updated")))
    }

    pub async fn change_theme_status(&self, params: &Params) -> ActionResult {
        common::change_state::<Theme, ThemeStatus>(self.store.as_ref(), params).await
    }

    /// Deleting a theme also drops its campaign links when forced.
    pub async fn delete_theme(&self, params: &Params) -> ActionResult {
        let id = params::require_id(params, "id")?;
        let force = params::flag(params, "force");
        let store = self.store.as_ref();

        let theme: Theme = common::fetch(store, id).await?;
        common::guard_dependencies(store, "Theme", id, THEME_DEPENDENTS, force).await?;
        let unlinked = CampaignThemeRepo::delete_for_theme(store, id).await?;
        common::delete_record::<Theme>(store, id).await?;

        tracing::info!(id, force, unlinked, "Theme deleted");
        Ok(Success::new(json!({ "id": id, "deleted": true }))
            .with_message(format!("Theme '{}' deleted", theme.nombre)))
    }

    pub async fn theme_stats(&self, _params: &Params) -> ActionResult {
        let themes: Vec<Theme> = EntityRepo::list_all(self.store.as_ref()).await?;
        let by_estado =
            count_by_known(&themes, &ThemeStatus::allowed_values(), |t| t.estado.as_str());
        let durations: Vec<f64> = themes
            .iter()
            .filter_map(|t| t.duracion)
            .map(|d| d as f64)
            .collect();
        let costs: Vec<f64> = themes.iter().filter_map(|t| t.costo_produccion).collect();

        Ok(Success::new(json!({
            "total": themes.len(),
            "por_estado": by_estado,
            "duracion_promedio": average(&durations, |d| *d),
            "costo_produccion_promedio": average(&costs, |c| *c),
            "costo_produccion_total": sum(&costs, |c| *c),
        })))
    }

    pub async fn export_themes(&self, params: &Params) -> ActionResult {
        common::export::<Theme>(
            self.store.as_ref(),
            &THEME_SEARCH,
            params,
            &self.settings,
            THEME_EXPORT_COLUMNS,
            "temas",
        )
        .await
    }
}
