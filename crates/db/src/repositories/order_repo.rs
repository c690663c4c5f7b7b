//! Order numbering lookups and order detail access.

use mediabuy_core::types::DbId;

use crate::models::order::{CreateOrderDetail, Order, OrderDetail};
use crate::store::{Filter, Query, Store, StoreError};

use super::EntityRepo;

pub struct OrderRepo;

impl OrderRepo {
    /// The highest `numero_orden` starting with `prefix`.
    ///
    /// Sequences are zero-padded, so the lexical maximum is the numeric one.
    pub async fn last_number_with_prefix(
        store: &dyn Store,
        prefix: &str,
    ) -> Result<Option<String>, StoreError> {
        let query = Query::new()
            .filter(Filter::Prefix("numero_orden", prefix.to_string()))
            .order_by("numero_orden", false)
            .limit(1);
        let orders: Vec<Order> = EntityRepo::find_many(store, &query).await?;
        Ok(orders.into_iter().next().map(|o| o.numero_orden))
    }
}

pub struct OrderDetailRepo;

impl OrderDetailRepo {
    pub async fn list_for_order(
        store: &dyn Store,
        id_orden: DbId,
    ) -> Result<Vec<OrderDetail>, StoreError> {
        let query = Query::new().filter(Filter::eq("id_orden", id_orden));
        EntityRepo::find_many(store, &query).await
    }

    pub async fn create(
        store: &dyn Store,
        detail: &CreateOrderDetail,
    ) -> Result<OrderDetail, StoreError> {
        EntityRepo::insert(store, detail).await
    }

    /// Remove every detail of an order. Returns how many were removed.
    pub async fn delete_for_order(store: &dyn Store, id_orden: DbId) -> Result<usize, StoreError> {
        let details = Self::list_for_order(store, id_orden).await?;
        let mut removed = 0;
        for detail in details {
            if EntityRepo::delete::<OrderDetail>(store, detail.id).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
