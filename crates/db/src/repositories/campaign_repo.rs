//! Lookups for campaign theme associations and plans.

use mediabuy_core::types::DbId;

use crate::models::campaign::{CampaignTheme, CreateCampaignTheme, Plan};
use crate::store::{Filter, Query, Store, StoreError};

use super::EntityRepo;

pub struct CampaignThemeRepo;

impl CampaignThemeRepo {
    /// The association between a campaign and a theme, if any.
    pub async fn find_pair(
        store: &dyn Store,
        id_campania: DbId,
        id_tema: DbId,
    ) -> Result<Option<CampaignTheme>, StoreError> {
        let query = Query::new()
            .filter(Filter::eq("id_campania", id_campania))
            .filter(Filter::eq("id_tema", id_tema))
            .limit(1);
        Ok(EntityRepo::find_many::<CampaignTheme>(store, &query)
            .await?
            .into_iter()
            .next())
    }

    pub async fn list_for_campaign(
        store: &dyn Store,
        id_campania: DbId,
    ) -> Result<Vec<CampaignTheme>, StoreError> {
        let query = Query::new().filter(Filter::eq("id_campania", id_campania));
        EntityRepo::find_many(store, &query).await
    }

    pub async fn create(
        store: &dyn Store,
        id_campania: DbId,
        id_tema: DbId,
    ) -> Result<CampaignTheme, StoreError> {
        EntityRepo::insert(store, &CreateCampaignTheme { id_campania, id_tema }).await
    }

    /// Remove every association of a campaign. Returns how many were removed.
    pub async fn delete_for_campaign(
        store: &dyn Store,
        id_campania: DbId,
    ) -> Result<usize, StoreError> {
        Self::delete_matching(store, Filter::eq("id_campania", id_campania)).await
    }

    /// Remove every association of a theme. Returns how many were removed.
    pub async fn delete_for_theme(store: &dyn Store, id_tema: DbId) -> Result<usize, StoreError> {
        Self::delete_matching(store, Filter::eq("id_tema", id_tema)).await
    }

    async fn delete_matching(store: &dyn Store, filter: Filter) -> Result<usize, StoreError> {
        let links: Vec<CampaignTheme> =
            EntityRepo::find_many(store, &Query::new().filter(filter)).await?;
        let mut removed = 0;
        for link in links {
            if EntityRepo::delete::<CampaignTheme>(store, link.id).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

pub struct PlanRepo;

impl PlanRepo {
    pub async fn list_for_campaign(
        store: &dyn Store,
        id_campania: DbId,
    ) -> Result<Vec<Plan>, StoreError> {
        let query = Query::new().filter(Filter::eq("id_campania", id_campania));
        EntityRepo::find_many(store, &query).await
    }
}
