//! Repositories over the [`Store`](crate::store::Store) trait.
//!
//! [`EntityRepo`] covers the CRUD shared by every table; the per-domain
//! repos add the few lookups that need more than one filter or a specific
//! ordering.

pub mod campaign_repo;
pub mod entity_repo;
pub mod order_repo;

pub use campaign_repo::{CampaignThemeRepo, PlanRepo};
pub use entity_repo::EntityRepo;
pub use order_repo::{OrderDetailRepo, OrderRepo};
