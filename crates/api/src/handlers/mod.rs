//! Domain action handlers.
//!
//! Each handler owns one or two tables, holds an injected store and the
//! engine's paging settings, and returns an [`ActionResult`] from every
//! operation. Handlers keep no state between calls.
//!
//! [`ActionResult`]: crate::envelope::ActionResult

pub mod campaign;
pub mod client;
pub mod common;
pub mod media;
pub mod order;
pub mod provider;

pub use campaign::CampaignHandler;
pub use client::ClientHandler;
pub use media::MediaHandler;
pub use order::OrderHandler;
pub use provider::ProviderHandler;
