//! Campaign actions, including theme associations.

use std::sync::Arc;

use serde_json::json;

use mediabuy_core::export::ExportColumn;
use mediabuy_core::stats::{average, count_by_known, sum};
use mediabuy_core::status::CampaignStatus;
use mediabuy_core::types::{Date, DbId};
use mediabuy_core::validation::{
    validate_date_order, validate_max_length, validate_non_negative, validate_required_text,
    FieldErrors, MAX_NAME_LENGTH, MAX_TEXT_LENGTH,
};
use mediabuy_db::models::campaign::{Campaign, CampaignTheme, CreateCampaign, UpdateCampaign};
use mediabuy_db::models::client::Client;
use mediabuy_db::models::media::Theme;
use mediabuy_db::repositories::{CampaignThemeRepo, EntityRepo, PlanRepo};
use mediabuy_db::{Store, Table};

use super::common::{self, DependencyCheck, FilterKind, SearchField, SearchSpec};
use crate::config::EngineSettings;
use crate::envelope::{ActionError, ActionResult, ErrorKind, Success};
use crate::params::{self, ParamReader, Params};

const SEARCH: SearchSpec = SearchSpec {
    fields: &[
        SearchField::contains("nombre"),
        SearchField::exact("id_cliente", FilterKind::Int),
        SearchField::exact("estado", FilterKind::State),
        SearchField::min("fecha_desde", "fecha_inicio", FilterKind::Date),
        SearchField::max("fecha_hasta", "fecha_fin", FilterKind::Date),
        SearchField::min("presupuesto_min", "presupuesto", FilterKind::Float),
        SearchField::max("presupuesto_max", "presupuesto", FilterKind::Float),
    ],
    sortable: &[
        "nombre", "fecha_inicio", "fecha_fin", "presupuesto", "estado", "created_at",
        "updated_at",
    ],
    default_sort: "fecha_inicio",
    default_ascending: false,
};

const EXPORT_COLUMNS: &[ExportColumn] = &[
    ExportColumn::new("id", "ID"),
    ExportColumn::new("nombre", "Nombre"),
    ExportColumn::new("id_cliente", "ID Cliente"),
    ExportColumn::new("fecha_inicio", "Fecha de Inicio"),
    ExportColumn::new("fecha_fin", "Fecha de Término"),
    ExportColumn::new("presupuesto", "Presupuesto"),
    ExportColumn::new("objetivo", "Objetivo"),
    ExportColumn::new("descripcion", "Descripción"),
    ExportColumn::new("estado", "Estado"),
    ExportColumn::new("created_at", "Fecha de Creación"),
];

const DEPENDENTS: &[DependencyCheck] = &[DependencyCheck {
    flag: "hasPlans",
    table: Table::Plans,
    column: "id_campania",
}];

struct CampaignFields {
    nombre: Option<String>,
    id_cliente: Option<DbId>,
    fecha_inicio: Option<Date>,
    fecha_fin: Option<Date>,
    presupuesto: Option<f64>,
    descripcion: Option<String>,
    objetivo: Option<String>,
}

fn read_campaign(reader: &mut ParamReader<'_>, require: bool) -> CampaignFields {
    let fields = CampaignFields {
        nombre: reader.text("nombre"),
        id_cliente: reader.id("id_cliente"),
        fecha_inicio: reader.date("fecha_inicio"),
        fecha_fin: reader.date("fecha_fin"),
        presupuesto: reader.float("presupuesto"),
        descripcion: reader.text("descripcion"),
        objetivo: reader.text("objetivo"),
    };
    let missing: Vec<&str> = if require {
        ["id_cliente", "fecha_inicio", "fecha_fin"]
            .into_iter()
            .filter(|key| !reader.has(key))
            .collect()
    } else {
        Vec::new()
    };

    let errors = reader.errors_mut();
    if require {
        errors.check(validate_required_text(
            "nombre",
            fields.nombre.as_deref(),
            MAX_NAME_LENGTH,
        ));
    } else if let Some(nombre) = &fields.nombre {
        errors.check(validate_max_length("nombre", nombre, MAX_NAME_LENGTH));
    }
    for key in missing {
        errors.push(format!("{key} is required"));
    }
    if let Some(presupuesto) = fields.presupuesto {
        errors.check(validate_non_negative("presupuesto", presupuesto));
    }
    if let Some(descripcion) = &fields.descripcion {
        errors.check(validate_max_length("descripcion", descripcion, MAX_TEXT_LENGTH));
    }
    if let Some(objetivo) = &fields.objetivo {
        errors.check(validate_max_length("objetivo", objetivo, MAX_TEXT_LENGTH));
    }
    fields
}

pub struct CampaignHandler {
    store: Arc<dyn Store>,
    settings: EngineSettings,
}

impl CampaignHandler {
    pub fn new(store: Arc<dyn Store>, settings: EngineSettings) -> Self {
        Self { store, settings }
    }

    /// Record an error for each referenced record that does not exist.
    async fn check_references(
        &self,
        errors: &mut FieldErrors,
        id_cliente: Option<DbId>,
        temas: &[DbId],
    ) -> Result<(), ActionError> {
        let store = self.store.as_ref();
        if let Some(id) = id_cliente {
            if EntityRepo::find_by_id::<Client>(store, id).await?.is_none() {
                errors.push(format!("id_cliente {id} does not reference an existing client"));
            }
        }
        for (i, id) in temas.iter().enumerate() {
            if EntityRepo::find_by_id::<Theme>(store, *id).await?.is_none() {
                errors.push(format!("temas[{i}] {id} does not reference an existing theme"));
            }
        }
        Ok(())
    }

    pub async fn create(&self, params: &Params) -> ActionResult {
        let mut reader = ParamReader::new(params);
        let fields = read_campaign(&mut reader, true);
        let temas = reader.id_list("temas").unwrap_or_default();
        let estado = match reader.text("estado") {
            Some(raw) => CampaignStatus::parse(&raw).unwrap_or_else(|| {
                reader.errors_mut().push(format!(
                    "estado must be one of: {}",
                    CampaignStatus::allowed_values().join(", ")
                ));
                CampaignStatus::default()
            }),
            None => CampaignStatus::default(),
        };
        let mut errors = reader.finish();
        if let (Some(inicio), Some(fin)) = (fields.fecha_inicio, fields.fecha_fin) {
            errors.check(validate_date_order(inicio, fin));
        }
        errors.into_result()?;

        let mut errors = FieldErrors::new();
        self.check_references(&mut errors, fields.id_cliente, &temas)
            .await?;
        errors.into_result()?;

        let (Some(nombre), Some(id_cliente), Some(fecha_inicio), Some(fecha_fin)) = (
            fields.nombre,
            fields.id_cliente,
            fields.fecha_inicio,
            fields.fecha_fin,
        ) else {
            return Err(ActionError::invalid(
                "nombre, id_cliente, fecha_inicio and fecha_fin are required",
            ));
        };
        let dto = CreateCampaign {
            nombre,
            id_cliente,
            fecha_inicio,
            fecha_fin,
            presupuesto: fields.presupuesto,
            descripcion: fields.descripcion,
            objetivo: fields.objetivo,
            estado,
        };
        let store = self.store.as_ref();
        let campaign: Campaign = EntityRepo::insert(store, &dto).await?;

        // Links are written one by one after the campaign exists.
        for id_tema in &temas {
            if CampaignThemeRepo::find_pair(store, campaign.id, *id_tema)
                .await?
                .is_none()
            {
                CampaignThemeRepo::create(store, campaign.id, *id_tema).await?;
            }
        }

        tracing::info!(
            id = campaign.id,
            nombre = %campaign.nombre,
            temas = temas.len(),
            "Campaign created"
        );
        let message = format!(
            "Campaign '{}' created with id {}",
            campaign.nombre, campaign.id
        );
        Ok(Success::record(&campaign)?.with_message(message))
    }

    pub async fn search(&self, params: &Params) -> ActionResult {
        common::search::<Campaign>(
            self.store.as_ref(),
            &SEARCH,
            params,
            &self.settings,
            "campaigns",
        )
        .await
    }

    /// The campaign record plus `temas` and `planes_count`.
    pub async fn get_by_id(&self, params: &Params) -> ActionResult {
        let id = params::require_id(params, "id")?;
        let store = self.store.as_ref();
        let campaign: Campaign = common::fetch(store, id).await?;
        let temas = self.linked_themes(id).await?;
        let planes = PlanRepo::list_for_campaign(store, id).await?;

        let mut data = common::to_json(&campaign)?;
        if let Some(obj) = data.as_object_mut() {
            obj.insert("temas".into(), common::to_json(&temas)?);
            obj.insert("planes_count".into(), json!(planes.len()));
        }
        Ok(Success::new(data))
    }

    pub async fn update(&self, params: &Params) -> ActionResult {
        let id = params::require_id(params, "id")?;
        let mut reader = ParamReader::new(params);
        let fields = read_campaign(&mut reader, false);
        common::reject_state_patch(params, reader.errors_mut());
        reader.finish().into_result()?;

        let patch = UpdateCampaign {
            nombre: fields.nombre,
            id_cliente: fields.id_cliente,
            fecha_inicio: fields.fecha_inicio,
            fecha_fin: fields.fecha_fin,
            presupuesto: fields.presupuesto,
            descripcion: fields.descripcion,
            objetivo: fields.objetivo,
        };
        if patch == UpdateCampaign::default() {
            return Err(ActionError::invalid("No fields to update"));
        }

        let store = self.store.as_ref();
        let current: Campaign = common::fetch(store, id).await?;
        let mut errors = FieldErrors::new();
        errors.check(validate_date_order(
            patch.fecha_inicio.unwrap_or(current.fecha_inicio),
            patch.fecha_fin.unwrap_or(current.fecha_fin),
        ));
        self.check_references(&mut errors, patch.id_cliente, &[])
            .await?;
        errors.into_result()?;

        let campaign: Campaign = EntityRepo::update(store, id, &patch)
            .await?
            .ok_or_else(|| ActionError::not_found("Campaign", id))?;

        tracing::info!(id, "Campaign updated");
        Ok(Success::record(&campaign)?.with_message(format!("Campaign {id} updated")))
    }

    pub async fn change_status(&self, params: &Params) -> ActionResult {
        common::change_state::<Campaign, CampaignStatus>(self.store.as_ref(), params).await
    }

    /// Deleting a campaign also drops its theme links.
    pub async fn delete(&self, params: &Params) -> ActionResult {
        let id = params::require_id(params, "id")?;
        let force = params::flag(params, "force");
        let store = self.store.as_ref();

        let campaign: Campaign = common::fetch(store, id).await?;
        common::guard_dependencies(store, "Campaign", id, DEPENDENTS, force).await?;
        let unlinked = CampaignThemeRepo::delete_for_campaign(store, id).await?;
        common::delete_record::<Campaign>(store, id).await?;

        tracing::info!(id, force, unlinked, "Campaign deleted");
        Ok(Success::new(json!({ "id": id, "deleted": true }))
            .with_message(format!("Campaign '{}' deleted", campaign.nombre)))
    }

    pub async fn stats(&self, _params: &Params) -> ActionResult {
        let campaigns: Vec<Campaign> = EntityRepo::list_all(self.store.as_ref()).await?;
        let by_estado = count_by_known(&campaigns, &CampaignStatus::allowed_values(), |c| {
            c.estado.as_str()
        });
        let budgets: Vec<f64> = campaigns.iter().filter_map(|c| c.presupuesto).collect();

        Ok(Success::new(json!({
            "total": campaigns.len(),
            "por_estado": by_estado,
            "presupuesto_total": sum(&budgets, |b| *b),
            "presupuesto_promedio": average(&budgets, |b| *b),
        })))
    }

    pub async fn export(&self, params: &Params) -> ActionResult {
        common::export::<Campaign>(
            self.store.as_ref(),
            &SEARCH,
            params,
            &self.settings,
            EXPORT_COLUMNS,
            "campanias",
        )
        .await
    }

    // -- Theme associations -------------------------------------------------

    pub async fn add_theme(&self, params: &Params) -> ActionResult {
        let id_campania = params::require_id(params, "id_campania")?;
        let id_tema = params::require_id(params, "id_tema")?;
        let store = self.store.as_ref();

        let campaign: Campaign = common::fetch(store, id_campania).await?;
        let theme: Theme = common::fetch(store, id_tema).await?;
        if CampaignThemeRepo::find_pair(store, id_campania, id_tema)
            .await?
            .is_some()
        {
            return Err(ActionError::invalid(format!(
                "Theme {id_tema} is already associated with campaign {id_campania}"
            )));
        }

        let link = CampaignThemeRepo::create(store, id_campania, id_tema).await?;
        tracing::info!(id_campania, id_tema, "Theme added to campaign");
        Ok(Success::record(&link)?.with_message(format!(
            "Theme '{}' added to campaign '{}'",
            theme.nombre, campaign.nombre
        )))
    }

    pub async fn remove_theme(&self, params: &Params) -> ActionResult {
        let id_campania = params::require_id(params, "id_campania")?;
        let id_tema = params::require_id(params, "id_tema")?;
        let store = self.store.as_ref();

        let link = CampaignThemeRepo::find_pair(store, id_campania, id_tema)
            .await?
            .ok_or_else(|| {
                ActionError::new(
                    ErrorKind::NotFound,
                    format!("Theme {id_tema} is not associated with campaign {id_campania}"),
                )
            })?;
        common::delete_record::<CampaignTheme>(store, link.id).await?;

        tracing::info!(id_campania, id_tema, "Theme removed from campaign");
        Ok(Success::new(json!({
            "id_campania": id_campania,
            "id_tema": id_tema,
            "removed": true,
        }))
        .with_message(format!(
            "Theme {id_tema} removed from campaign {id_campania}"
        )))
    }

    pub async fn themes(&self, params: &Params) -> ActionResult {
        let id_campania = params::require_id(params, "id_campania")?;
        let _: Campaign = common::fetch(self.store.as_ref(), id_campania).await?;
        let themes = self.linked_themes(id_campania).await?;
        let count = themes.len();
        Ok(Success::record(&themes)?.with_count(count))
    }

    /// Theme records linked to a campaign, in link order. Links whose theme
    /// is gone are skipped.
    async fn linked_themes(&self, id_campania: DbId) -> Result<Vec<Theme>, ActionError> {
        let store = self.store.as_ref();
        let links = CampaignThemeRepo::list_for_campaign(store, id_campania).await?;
        let mut themes = Vec::with_capacity(links.len());
        for link in links {
            if let Some(theme) = EntityRepo::find_by_id::<Theme>(store, link.id_tema).await? {
                themes.push(theme);
            }
        }
        Ok(themes)
    }
}
