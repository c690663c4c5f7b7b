//! Pure domain logic for the media agency action engine.
//!
//! Zero internal dependencies: state enums, field validation, order
//! numbering, CSV export and aggregate helpers live here so the store and
//! handler layers can share them.

pub mod error;
pub mod export;
pub mod order_number;
pub mod search;
pub mod stats;
pub mod status;
pub mod types;
pub mod validation;
