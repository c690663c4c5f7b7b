//! State enums for every entity the engine manages.
//!
//! Each enum maps to the lowercase text stored in the `estado` (or
//! `prioridad` / `tipo`) column. Transitions are set-membership checked
//! only: any state is reachable from any other.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Common surface of the stored enums, for code generic over the entity.
pub trait StateSet: Copy + Sized + Send + Sync + 'static {
    /// Column the value is stored under.
    const FIELD: &'static str;

    fn as_str(self) -> &'static str;

    fn parse(value: &str) -> Option<Self>;

    fn allowed_values() -> Vec<&'static str>;
}

macro_rules! define_state_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($field:literal) {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $val)] $variant ),+
        }

        impl $name {
            /// Every value in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Column name this enum is stored under.
            pub const FIELD: &'static str = $field;

            /// The stored text for this value.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $val),+
                }
            }

            /// Parse a caller-supplied value. Surrounding whitespace and
            /// letter case are ignored.
            pub fn parse(value: &str) -> Option<Self> {
                let normalized = value.trim().to_lowercase();
                match normalized.as_str() {
                    $($val => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// All accepted stored values.
            pub fn allowed_values() -> Vec<&'static str> {
                Self::ALL.iter().map(|v| v.as_str()).collect()
            }

            /// Parse or fail with [`CoreError::InvalidValue`].
            pub fn try_parse(value: &str) -> Result<Self, CoreError> {
                Self::parse(value).ok_or_else(|| CoreError::InvalidValue {
                    field: $field,
                    value: value.to_string(),
                    allowed: Self::allowed_values(),
                })
            }
        }

        impl StateSet for $name {
            const FIELD: &'static str = $field;

            fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $val),+
                }
            }

            fn parse(value: &str) -> Option<Self> {
                $name::parse(value)
            }

            fn allowed_values() -> Vec<&'static str> {
                $name::allowed_values()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

define_state_enum! {
    /// Client lifecycle.
    #[derive(Default)]
    ClientStatus ("estado") {
        #[default]
        Activo = "activo",
        Inactivo = "inactivo",
        Suspendido = "suspendido",
    }
}

define_state_enum! {
    /// Provider lifecycle. `bloqueado` is reserved for providers the agency
    /// must not place orders with.
    #[derive(Default)]
    ProviderStatus ("estado") {
        #[default]
        Activo = "activo",
        Inactivo = "inactivo",
        Suspendido = "suspendido",
        Bloqueado = "bloqueado",
    }
}

define_state_enum! {
    /// Media catalog entry lifecycle.
    #[derive(Default)]
    MediaStatus ("estado") {
        #[default]
        Activo = "activo",
        Inactivo = "inactivo",
        Archivado = "archivado",
    }
}

define_state_enum! {
    /// Theme (creative piece) lifecycle.
    #[derive(Default)]
    ThemeStatus ("estado") {
        #[default]
        Activo = "activo",
        Inactivo = "inactivo",
        Archivado = "archivado",
    }
}

define_state_enum! {
    /// Campaign lifecycle.
    #[derive(Default)]
    CampaignStatus ("estado") {
        #[default]
        Planificacion = "planificacion",
        Activa = "activa",
        Pausada = "pausada",
        Finalizada = "finalizada",
        Cancelada = "cancelada",
    }
}

define_state_enum! {
    /// Purchase order lifecycle.
    #[derive(Default)]
    OrderStatus ("estado") {
        #[default]
        Pendiente = "pendiente",
        Confirmada = "confirmada",
        EnProceso = "en_proceso",
        Entregada = "entregada",
        Cancelada = "cancelada",
        Rechazada = "rechazada",
    }
}

define_state_enum! {
    /// Purchase order priority.
    #[derive(Default)]
    OrderPriority ("prioridad") {
        Baja = "baja",
        #[default]
        Normal = "normal",
        Alta = "alta",
        Urgente = "urgente",
    }
}

define_state_enum! {
    /// Kind of advertising outlet a media entry represents.
    MediaType ("tipo") {
        Television = "television",
        Radio = "radio",
        Prensa = "prensa",
        Revista = "revista",
        Digital = "digital",
        Exterior = "exterior",
        Cine = "cine",
    }
}

impl OrderStatus {
    /// Orders in these states have work underway and are only deleted when
    /// the caller forces it.
    pub fn blocks_deletion(self) -> bool {
        matches!(self, OrderStatus::EnProceso | OrderStatus::Entregada)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_round_trips_stored_text() {
        for status in OrderStatus::ALL {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(*status));
        }
        assert_eq!(OrderStatus::EnProceso.as_str(), "en_proceso");
    }

    #[test]
    fn parse_ignores_case_and_whitespace() {
        assert_eq!(ClientStatus::parse("  Activo "), Some(ClientStatus::Activo));
        assert_eq!(OrderPriority::parse("URGENTE"), Some(OrderPriority::Urgente));
    }

    #[test]
    fn parse_rejects_values_outside_the_set() {
        assert_eq!(ClientStatus::parse("bloqueado"), None);
        assert_eq!(ProviderStatus::parse("bloqueado"), Some(ProviderStatus::Bloqueado));
        assert_eq!(CampaignStatus::parse(""), None);
    }

    #[test]
    fn try_parse_reports_allowed_values() {
        let err = OrderPriority::try_parse("maxima").unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidValue {
                field: "prioridad",
                value: "maxima".to_string(),
                allowed: vec!["baja", "normal", "alta", "urgente"],
            }
        );
    }

    #[test]
    fn defaults_are_initial_states() {
        assert_eq!(CampaignStatus::default(), CampaignStatus::Planificacion);
        assert_eq!(OrderStatus::default(), OrderStatus::Pendiente);
        assert_eq!(OrderPriority::default(), OrderPriority::Normal);
        assert_eq!(ClientStatus::default(), ClientStatus::Activo);
        assert_eq!(ProviderStatus::default(), ProviderStatus::Activo);
        assert_eq!(MediaStatus::default(), MediaStatus::Activo);
        assert_eq!(ThemeStatus::default(), ThemeStatus::Activo);
    }

    #[test]
    fn only_active_orders_block_deletion() {
        assert!(OrderStatus::EnProceso.blocks_deletion());
        assert!(OrderStatus::Entregada.blocks_deletion());
        assert!(!OrderStatus::Pendiente.blocks_deletion());
        assert!(!OrderStatus::Cancelada.blocks_deletion());
    }

    fn allowed_for<S: StateSet>() -> Vec<&'static str> {
        S::allowed_values()
    }

    #[test]
    fn generic_access_matches_inherent() {
        assert_eq!(allowed_for::<MediaStatus>(), vec!["activo", "inactivo", "archivado"]);
        assert_eq!(<OrderStatus as StateSet>::FIELD, "estado");
        assert_eq!(<OrderPriority as StateSet>::FIELD, "prioridad");
        assert_eq!(
            <CampaignStatus as StateSet>::parse("Activa").map(StateSet::as_str),
            Some("activa")
        );
    }

    #[test]
    fn serde_uses_stored_text() {
        let json = serde_json::to_value(MediaType::Television).unwrap();
        assert_eq!(json, "television");
        let parsed: OrderStatus = serde_json::from_value("en_proceso".into()).unwrap();
        assert_eq!(parsed, OrderStatus::EnProceso);
    }
}
