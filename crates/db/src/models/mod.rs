//! Typed rows for every engine table.
//!
//! Each entity has a row struct plus `Create*` / `Update*` DTOs. DTOs skip
//! `None` fields when serialized, so an update patch carries only the
//! columns it changes.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::store::Table;

pub mod campaign;
pub mod client;
pub mod media;
pub mod order;
pub mod provider;

/// A row type bound to its table.
pub trait Entity: DeserializeOwned + Serialize + Send + Sync + 'static {
    const TABLE: Table;
    /// Human-readable singular name used in messages.
    const NAME: &'static str;
}
