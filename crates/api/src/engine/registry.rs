//! The catalog of intents the engine can execute.
//!
//! One declaration produces both the [`Intent`] enum the dispatcher matches
//! on and the descriptor table callers introspect, so the two cannot drift.
//! `required` params are enforced by the dispatcher before a handler runs;
//! `optional` params are documentation for callers.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

/// Domain handler an intent is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerKind {
    Client,
    Provider,
    Media,
    Campaign,
    Order,
}

impl HandlerKind {
    pub const ALL: &'static [HandlerKind] = &[
        HandlerKind::Client,
        HandlerKind::Provider,
        HandlerKind::Media,
        HandlerKind::Campaign,
        HandlerKind::Order,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HandlerKind::Client => "client",
            HandlerKind::Provider => "provider",
            HandlerKind::Media => "media",
            HandlerKind::Campaign => "campaign",
            HandlerKind::Order => "order",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_lowercase();
        Self::ALL.iter().copied().find(|k| k.as_str() == normalized)
    }
}

impl std::fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle phase an intent belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Create,
    Read,
    Update,
    Delete,
    Export,
    Stats,
}

/// Static description of one intent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentDescriptor {
    #[serde(skip)]
    pub intent: Intent,
    pub name: &'static str,
    pub handler: HandlerKind,
    pub method: &'static str,
    pub phase: Phase,
    pub required_params: &'static [&'static str],
    pub optional_params: &'static [&'static str],
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Intent '{0}' is declared more than once")]
    DuplicateName(&'static str),

    #[error("Intent '{intent}' lists '{param}' as both required and optional")]
    ParamOverlap {
        intent: &'static str,
        param: &'static str,
    },

    #[error("Intent '{0}' has no description")]
    EmptyDescription(&'static str),

    #[error("Intent '{0}' declares a blank parameter name")]
    BlankParam(&'static str),
}

macro_rules! intents {
    (
        $(
            $variant:ident => $name:literal {
                handler: $handler:ident,
                method: $method:literal,
                phase: $phase:ident,
                required: [$($req:literal),* $(,)?],
                optional: [$($opt:literal),* $(,)?],
                description: $desc:literal $(,)?
            }
        ),+ $(,)?
    ) => {
        /// Every executable intent.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Intent {
            $($variant),+
        }

        impl Intent {
            pub const ALL: &'static [Intent] = &[$(Intent::$variant),+];

            pub fn name(self) -> &'static str {
                match self {
                    $(Intent::$variant => $name),+
                }
            }
        }

        /// The built-in descriptor table.
        pub const DESCRIPTORS: &[IntentDescriptor] = &[
            $(
                IntentDescriptor {
                    intent: Intent::$variant,
                    name: $name,
                    handler: HandlerKind::$handler,
                    method: $method,
                    phase: Phase::$phase,
                    required_params: &[$($req),*],
                    optional_params: &[$($opt),*],
                    description: $desc,
                }
            ),+
        ];
    };
}

intents! {
    // -- Client --------------------------------------------------------------
    CreateClient => "CREATE_CLIENT" {
        handler: Client, method: "create", phase: Create,
        required: [],
        optional: ["nombre", "rut", "razon_social", "giro", "direccion", "ciudad", "region",
                   "telefono", "email", "contacto", "id_agencia", "observaciones", "estado"],
        description: "Register a new client. nombre and rut are validated as required.",
    },
    SearchClients => "SEARCH_CLIENTS" {
        handler: Client, method: "search", phase: Read,
        required: [],
        optional: ["nombre", "razon_social", "rut", "ciudad", "region", "email", "estado",
                   "id_agencia", "order_by", "ascending", "limit", "offset"],
        description: "Search clients by name, tax id, location or state.",
    },
    GetClient => "GET_CLIENT" {
        handler: Client, method: "get_by_id", phase: Read,
        required: ["id"], optional: [],
        description: "Fetch one client by id.",
    },
    UpdateClient => "UPDATE_CLIENT" {
        handler: Client, method: "update", phase: Update,
        required: ["id"],
        optional: ["nombre", "rut", "razon_social", "giro", "direccion", "ciudad", "region",
                   "telefono", "email", "contacto", "id_agencia", "observaciones"],
        description: "Patch a client's fields. Only supplied fields change.",
    },
    ChangeClientStatus => "CHANGE_CLIENT_STATUS" {
        handler: Client, method: "change_status", phase: Update,
        required: ["id", "estado"], optional: [],
        description: "Set a client's state (activo, inactivo, suspendido).",
    },
    DeleteClient => "DELETE_CLIENT" {
        handler: Client, method: "delete", phase: Delete,
        required: ["id"], optional: ["force"],
        description: "Delete a client. Refused while campaigns or orders reference it unless forced.",
    },
    GetClientStats => "GET_CLIENT_STATS" {
        handler: Client, method: "stats", phase: Stats,
        required: [], optional: [],
        description: "Client totals by state.",
    },
    ExportClients => "EXPORT_CLIENTS" {
        handler: Client, method: "export", phase: Export,
        required: [],
        optional: ["nombre", "razon_social", "rut", "ciudad", "region", "email", "estado",
                   "id_agencia", "order_by", "ascending", "limit"],
        description: "Export matching clients as CSV.",
    },

    // -- Provider ------------------------------------------------------------
    CreateProvider => "CREATE_PROVIDER" {
        handler: Provider, method: "create", phase: Create,
        required: [],
        optional: ["nombre", "rut", "razon_social", "giro", "direccion", "ciudad", "region",
                   "telefono", "email", "contacto", "id_agencia", "observaciones", "comision",
                   "dias_pago", "estado"],
        description: "Register a new provider. nombre and rut are validated as required.",
    },
    SearchProviders => "SEARCH_PROVIDERS" {
        handler: Provider, method: "search", phase: Read,
        required: [],
        optional: ["nombre", "razon_social", "rut", "ciudad", "region", "estado",
                   "comision_min", "comision_max", "dias_pago_min", "dias_pago_max",
                   "order_by", "ascending", "limit", "offset"],
        description: "Search providers by name, tax id, state or commercial terms.",
    },
    GetProvider => "GET_PROVIDER" {
        handler: Provider, method: "get_by_id", phase: Read,
        required: ["id"], optional: [],
        description: "Fetch one provider by id.",
    },
    UpdateProvider => "UPDATE_PROVIDER" {
        handler: Provider, method: "update", phase: Update,
        required: ["id"],
        optional: ["nombre", "rut", "razon_social", "giro", "direccion", "ciudad", "region",
                   "telefono", "email", "contacto", "id_agencia", "observaciones", "comision",
                   "dias_pago"],
        description: "Patch a provider's fields. Only supplied fields change.",
    },
    ChangeProviderStatus => "CHANGE_PROVIDER_STATUS" {
        handler: Provider, method: "change_status", phase: Update,
        required: ["id", "estado"], optional: [],
        description: "Set a provider's state (activo, inactivo, suspendido, bloqueado).",
    },
    DeleteProvider => "DELETE_PROVIDER" {
        handler: Provider, method: "delete", phase: Delete,
        required: ["id"], optional: ["force"],
        description: "Delete a provider. Refused while orders reference it unless forced.",
    },
    GetProviderStats => "GET_PROVIDER_STATS" {
        handler: Provider, method: "stats", phase: Stats,
        required: [], optional: [],
        description: "Provider totals by state and average commercial terms.",
    },
    ExportProviders => "EXPORT_PROVIDERS" {
        handler: Provider, method: "export", phase: Export,
        required: [],
        optional: ["nombre", "razon_social", "rut", "ciudad", "region", "estado",
                   "comision_min", "comision_max", "dias_pago_min", "dias_pago_max",
                   "order_by", "ascending", "limit"],
        description: "Export matching providers as CSV.",
    },

    // -- Media ---------------------------------------------------------------
    CreateMedia => "CREATE_MEDIA" {
        handler: Media, method: "create_media", phase: Create,
        required: [],
        optional: ["nombre", "tipo", "id_proveedor", "costo", "alcance", "frecuencia",
                   "descripcion", "estado"],
        description: "Register a media outlet. nombre and tipo are validated as required.",
    },
    SearchMedia => "SEARCH_MEDIA" {
        handler: Media, method: "search_media", phase: Read,
        required: [],
        optional: ["nombre", "tipo", "estado", "id_proveedor", "costo_min", "costo_max",
                   "alcance_min", "alcance_max", "order_by", "ascending", "limit", "offset"],
        description: "Search media outlets by name, type, provider, state or cost.",
    },
    GetMedia => "GET_MEDIA" {
        handler: Media, method: "get_media", phase: Read,
        required: ["id"], optional: [],
        description: "Fetch one media outlet by id.",
    },
    UpdateMedia => "UPDATE_MEDIA" {
        handler: Media, method: "update_media", phase: Update,
        required: ["id"],
        optional: ["nombre", "tipo", "id_proveedor", "costo", "alcance", "frecuencia",
                   "descripcion"],
        description: "Patch a media outlet's fields. Only supplied fields change.",
    },
    ChangeMediaStatus => "CHANGE_MEDIA_STATUS" {
        handler: Media, method: "change_media_status", phase: Update,
        required: ["id", "estado"], optional: [],
        description: "Set a media outlet's state (activo, inactivo, archivado).",
    },
    DeleteMedia => "DELETE_MEDIA" {
        handler: Media, method: "delete_media", phase: Delete,
        required: ["id"], optional: ["force"],
        description: "Delete a media outlet. Refused while plans use it unless forced.",
    },
    GetMediaStats => "GET_MEDIA_STATS" {
        handler: Media, method: "media_stats", phase: Stats,
        required: [], optional: [],
        description: "Media totals by state and type with cost and reach averages.",
    },
    ExportMedia => "EXPORT_MEDIA" {
        handler: Media, method: "export_media", phase: Export,
        required: [],
        optional: ["nombre", "tipo", "estado", "id_proveedor", "costo_min", "costo_max",
                   "alcance_min", "alcance_max", "order_by", "ascending", "limit"],
        description: "Export matching media outlets as CSV.",
    },
    CreateTheme => "CREATE_THEME" {
        handler: Media, method: "create_theme", phase: Create,
        required: [],
        optional: ["nombre", "descripcion", "id_cliente", "costo_produccion", "duracion",
                   "estado"],
        description: "Register a theme (creative piece). nombre is validated as required.",
    },
    SearchThemes => "SEARCH_THEMES" {
        handler: Media, method: "search_themes", phase: Read,
        required: [],
        optional: ["nombre", "estado", "id_cliente", "duracion_min", "duracion_max",
                   "order_by", "ascending", "limit", "offset"],
        description: "Search themes by name, client, state or duration.",
    },
    GetTheme => "GET_THEME" {
        handler: Media, method: "get_theme", phase: Read,
        required: ["id"], optional: [],
        description: "Fetch one theme by id.",
    },
    UpdateTheme => "UPDATE_THEME" {
        handler: Media, method: "update_theme", phase: Update,
        required: ["id"],
        optional: ["nombre", "descripcion", "id_cliente", "costo_produccion", "duracion"],
        description: "Patch a theme's fields. Only supplied fields change.",
    },
    ChangeThemeStatus => "CHANGE_THEME_STATUS" {
        handler: Media, method: "change_theme_status", phase: Update,
        required: ["id", "estado"], optional: [],
        description: "Set a theme's state (activo, inactivo, archivado).",
    },
    DeleteTheme => "DELETE_THEME" {
        handler: Media, method: "delete_theme", phase: Delete,
        required: ["id"], optional: ["force"],
        description: "Delete a theme. Refused while campaigns use it unless forced.",
    },
    GetThemeStats => "GET_THEME_STATS" {
        handler: Media, method: "theme_stats", phase: Stats,
        required: [], optional: [],
        description: "Theme totals by state with duration and production cost averages.",
    },
    ExportThemes => "EXPORT_THEMES" {
        handler: Media, method: "export_themes", phase: Export,
        required: [],
        optional: ["nombre", "estado", "id_cliente", "duracion_min", "duracion_max",
                   "order_by", "ascending", "limit"],
        description: "Export matching themes as CSV.",
    },

    // -- Campaign ------------------------------------------------------------
    CreateCampaign => "CREATE_CAMPAIGN" {
        handler: Campaign, method: "create", phase: Create,
        required: [],
        optional: ["nombre", "id_cliente", "fecha_inicio", "fecha_fin", "presupuesto",
                   "descripcion", "objetivo", "estado", "temas"],
        description: "Create a campaign for a client, optionally attaching themes.",
    },
    SearchCampaigns => "SEARCH_CAMPAIGNS" {
        handler: Campaign, method: "search", phase: Read,
        required: [],
        optional: ["nombre", "id_cliente", "estado", "fecha_desde", "fecha_hasta",
                   "presupuesto_min", "presupuesto_max", "order_by", "ascending", "limit",
                   "offset"],
        description: "Search campaigns by name, client, state, dates or budget.",
    },
    GetCampaign => "GET_CAMPAIGN" {
        handler: Campaign, method: "get_by_id", phase: Read,
        required: ["id"], optional: [],
        description: "Fetch one campaign with its themes and plan count.",
    },
    UpdateCampaign => "UPDATE_CAMPAIGN" {
        handler: Campaign, method: "update", phase: Update,
        required: ["id"],
        optional: ["nombre", "id_cliente", "fecha_inicio", "fecha_fin", "presupuesto",
                   "descripcion", "objetivo"],
        description: "Patch a campaign's fields. Dates are checked against the merged record.",
    },
    ChangeCampaignStatus => "CHANGE_CAMPAIGN_STATUS" {
        handler: Campaign, method: "change_status", phase: Update,
        required: ["id", "estado"], optional: [],
        description: "Set a campaign's state (planificacion, activa, pausada, finalizada, cancelada).",
    },
    DeleteCampaign => "DELETE_CAMPAIGN" {
        handler: Campaign, method: "delete", phase: Delete,
        required: ["id"], optional: ["force"],
        description: "Delete a campaign and its theme links. Refused while plans exist unless forced.",
    },
    GetCampaignStats => "GET_CAMPAIGN_STATS" {
        handler: Campaign, method: "stats", phase: Stats,
        required: [], optional: [],
        description: "Campaign totals by state with budget sum and average.",
    },
    ExportCampaigns => "EXPORT_CAMPAIGNS" {
        handler: Campaign, method: "export", phase: Export,
        required: [],
        optional: ["nombre", "id_cliente", "estado", "fecha_desde", "fecha_hasta",
                   "presupuesto_min", "presupuesto_max", "order_by", "ascending", "limit"],
        description: "Export matching campaigns as CSV.",
    },
    AddCampaignTheme => "ADD_CAMPAIGN_THEME" {
        handler: Campaign, method: "add_theme", phase: Update,
        required: ["id_campania", "id_tema"], optional: [],
        description: "Attach a theme to a campaign.",
    },
    RemoveCampaignTheme => "REMOVE_CAMPAIGN_THEME" {
        handler: Campaign, method: "remove_theme", phase: Update,
        required: ["id_campania", "id_tema"], optional: [],
        description: "Detach a theme from a campaign.",
    },
    GetCampaignThemes => "GET_CAMPAIGN_THEMES" {
        handler: Campaign, method: "themes", phase: Read,
        required: ["id_campania"], optional: [],
        description: "List the themes attached to a campaign.",
    },

    // -- Order ---------------------------------------------------------------
    CreateOrder => "CREATE_ORDER" {
        handler: Order, method: "create", phase: Create,
        required: [],
        optional: ["id_cliente", "id_proveedor", "id_campania", "descripcion", "monto_total",
                   "fecha_emision", "fecha_entrega", "prioridad", "estado", "observaciones",
                   "detalles"],
        description: "Issue a purchase order with a generated number and optional line items. With detalles, monto_total is their sum and cannot be supplied.",
    },
    SearchOrders => "SEARCH_ORDERS" {
        handler: Order, method: "search", phase: Read,
        required: [],
        optional: ["numero_orden", "id_cliente", "id_proveedor", "id_campania", "estado",
                   "prioridad", "fecha_desde", "fecha_hasta", "monto_min", "monto_max",
                   "order_by", "ascending", "limit", "offset"],
        description: "Search orders by number, parties, state, priority, dates or amount.",
    },
    GetOrder => "GET_ORDER" {
        handler: Order, method: "get_by_id", phase: Read,
        required: ["id"], optional: [],
        description: "Fetch one order with its line items.",
    },
    UpdateOrder => "UPDATE_ORDER" {
        handler: Order, method: "update", phase: Update,
        required: ["id"],
        optional: ["id_cliente", "id_proveedor", "id_campania", "descripcion", "monto_total",
                   "fecha_emision", "fecha_entrega", "observaciones"],
        description: "Patch an order's header fields. Only supplied fields change. monto_total is refused while the order has details.",
    },
    ChangeOrderStatus => "CHANGE_ORDER_STATUS" {
        handler: Order, method: "change_status", phase: Update,
        required: ["id", "estado"], optional: [],
        description: "Set an order's state (pendiente, confirmada, en_proceso, entregada, cancelada, rechazada).",
    },
    ChangeOrderPriority => "CHANGE_ORDER_PRIORITY" {
        handler: Order, method: "change_priority", phase: Update,
        required: ["id", "prioridad"], optional: [],
        description: "Set an order's priority (baja, normal, alta, urgente).",
    },
    DeleteOrder => "DELETE_ORDER" {
        handler: Order, method: "delete", phase: Delete,
        required: ["id"], optional: ["force"],
        description: "Delete an order and its line items. Orders in progress or delivered need force.",
    },
    GetOrderStats => "GET_ORDER_STATS" {
        handler: Order, method: "stats", phase: Stats,
        required: [], optional: [],
        description: "Order totals by state and priority with amount sum and average.",
    },
    ExportOrders => "EXPORT_ORDERS" {
        handler: Order, method: "export", phase: Export,
        required: [],
        optional: ["numero_orden", "id_cliente", "id_proveedor", "id_campania", "estado",
                   "prioridad", "fecha_desde", "fecha_hasta", "monto_min", "monto_max",
                   "order_by", "ascending", "limit"],
        description: "Export matching orders as CSV.",
    },
    AddOrderDetail => "ADD_ORDER_DETAIL" {
        handler: Order, method: "add_detail", phase: Update,
        required: ["id_orden", "descripcion", "cantidad", "precio_unitario"], optional: [],
        description: "Add a line item to an order and recompute its total.",
    },
    RemoveOrderDetail => "REMOVE_ORDER_DETAIL" {
        handler: Order, method: "remove_detail", phase: Update,
        required: ["id"], optional: [],
        description: "Remove a line item and recompute its order's total.",
    },
    GenerateOrderNumber => "GENERATE_ORDER_NUMBER" {
        handler: Order, method: "generate_order_number", phase: Read,
        required: [], optional: [],
        description: "Preview the next order number for today without reserving it. Repeated calls return the same number until an order is created.",
    },
}

/// Validated, indexed view over a descriptor table.
#[derive(Debug, Clone)]
pub struct Registry {
    descriptors: &'static [IntentDescriptor],
    by_name: HashMap<&'static str, usize>,
}

impl Registry {
    /// The built-in catalog.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::from_descriptors(DESCRIPTORS)
    }

    /// Validate a descriptor table: unique names, non-blank parameter
    /// names, no parameter both required and optional, and a description
    /// for every entry.
    pub fn from_descriptors(
        descriptors: &'static [IntentDescriptor],
    ) -> Result<Self, RegistryError> {
        let mut by_name = HashMap::with_capacity(descriptors.len());

        for (idx, d) in descriptors.iter().enumerate() {
            if by_name.insert(d.name, idx).is_some() {
                return Err(RegistryError::DuplicateName(d.name));
            }
            if d.description.trim().is_empty() {
                return Err(RegistryError::EmptyDescription(d.name));
            }
            let params = d.required_params.iter().chain(d.optional_params);
            if params.clone().any(|p| p.trim().is_empty()) {
                return Err(RegistryError::BlankParam(d.name));
            }
            let required: HashSet<&str> = d.required_params.iter().copied().collect();
            if let Some(param) = d.optional_params.iter().find(|p| required.contains(*p)) {
                return Err(RegistryError::ParamOverlap {
                    intent: d.name,
                    param: *param,
                });
            }
        }

        Ok(Self {
            descriptors,
            by_name,
        })
    }

    /// Look up an intent by exact name.
    pub fn get(&self, name: &str) -> Option<&IntentDescriptor> {
        self.by_name.get(name).map(|idx| &self.descriptors[*idx])
    }

    pub fn all(&self) -> &[IntentDescriptor] {
        self.descriptors
    }

    pub fn by_handler(&self, handler: HandlerKind) -> Vec<&IntentDescriptor> {
        self.descriptors
            .iter()
            .filter(|d| d.handler == handler)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_valid_and_complete() {
        let registry = Registry::builtin().unwrap();
        assert_eq!(registry.len(), Intent::ALL.len());
        for intent in Intent::ALL {
            let d = registry.get(intent.name()).unwrap();
            assert_eq!(d.intent, *intent);
        }
    }

    #[test]
    fn lookup_is_exact() {
        let registry = Registry::builtin().unwrap();
        assert!(registry.get("CREATE_CLIENT").is_some());
        assert!(registry.get("create_client").is_none());
        assert!(registry.get("CREATE_CLIENT ").is_none());
    }

    #[test]
    fn by_handler_partitions_the_catalog() {
        let registry = Registry::builtin().unwrap();
        let total: usize = HandlerKind::ALL
            .iter()
            .map(|k| registry.by_handler(*k).len())
            .sum();
        assert_eq!(total, registry.len());
        assert_eq!(registry.by_handler(HandlerKind::Media).len(), 16);
        assert_eq!(registry.by_handler(HandlerKind::Order).len(), 12);
    }

    #[test]
    fn create_intents_require_nothing() {
        let registry = Registry::builtin().unwrap();
        for d in registry.all().iter().filter(|d| d.phase == Phase::Create) {
            assert!(d.required_params.is_empty(), "{} requires params", d.name);
        }
    }

    static DUPLICATED: &[IntentDescriptor] = &[
        IntentDescriptor {
            intent: Intent::GetClient,
            name: "GET_CLIENT",
            handler: HandlerKind::Client,
            method: "get_by_id",
            phase: Phase::Read,
            required_params: &["id"],
            optional_params: &[],
            description: "first",
        },
        IntentDescriptor {
            intent: Intent::GetClient,
            name: "GET_CLIENT",
            handler: HandlerKind::Client,
            method: "get_by_id",
            phase: Phase::Read,
            required_params: &["id"],
            optional_params: &[],
            description: "second",
        },
    ];

    static OVERLAPPING: &[IntentDescriptor] = &[IntentDescriptor {
        intent: Intent::DeleteClient,
        name: "DELETE_CLIENT",
        handler: HandlerKind::Client,
        method: "delete",
        phase: Phase::Delete,
        required_params: &["id"],
        optional_params: &["id", "force"],
        description: "overlap",
    }];

    static UNDESCRIBED: &[IntentDescriptor] = &[IntentDescriptor {
        intent: Intent::GetClientStats,
        name: "GET_CLIENT_STATS",
        handler: HandlerKind::Client,
        method: "stats",
        phase: Phase::Stats,
        required_params: &[],
        optional_params: &[],
        description: "  ",
    }];

    #[test]
    fn malformed_tables_are_rejected() {
        assert_eq!(
            Registry::from_descriptors(DUPLICATED).unwrap_err(),
            RegistryError::DuplicateName("GET_CLIENT")
        );
        assert_eq!(
            Registry::from_descriptors(OVERLAPPING).unwrap_err(),
            RegistryError::ParamOverlap {
                intent: "DELETE_CLIENT",
                param: "id"
            }
        );
        assert_eq!(
            Registry::from_descriptors(UNDESCRIBED).unwrap_err(),
            RegistryError::EmptyDescription("GET_CLIENT_STATS")
        );
    }

    #[test]
    fn handler_names_parse_case_insensitively() {
        assert_eq!(HandlerKind::parse(" Order "), Some(HandlerKind::Order));
        assert_eq!(HandlerKind::parse("invoice"), None);
    }

    #[test]
    fn descriptors_serialize_camel_case() {
        let registry = Registry::builtin().unwrap();
        let json = serde_json::to_value(registry.get("DELETE_PROVIDER").unwrap()).unwrap();
        assert_eq!(json["handler"], "provider");
        assert_eq!(json["requiredParams"], serde_json::json!(["id"]));
        assert_eq!(json["optionalParams"], serde_json::json!(["force"]));
        assert_eq!(json["phase"], "delete");
        assert!(json.get("intent").is_none());
    }
}
