//! Generic CRUD for any [`Entity`], plus record encoding helpers.

use serde::Serialize;
use serde_json::Value;

use mediabuy_core::types::DbId;

use crate::models::Entity;
use crate::store::{Filter, Query, Record, Store, StoreError, Table};

/// Provides CRUD operations for every entity table.
pub struct EntityRepo;

impl EntityRepo {
    /// Find a row by its primary key.
    pub async fn find_by_id<T: Entity>(
        store: &dyn Store,
        id: DbId,
    ) -> Result<Option<T>, StoreError> {
        let rows = store.select(T::TABLE, &Query::by_id(id)).await?;
        rows.into_iter().next().map(decode::<T>).transpose()
    }

    /// Rows matching `query`.
    pub async fn find_many<T: Entity>(
        store: &dyn Store,
        query: &Query,
    ) -> Result<Vec<T>, StoreError> {
        let rows = store.select(T::TABLE, query).await?;
        rows.into_iter().map(decode::<T>).collect()
    }

    /// Every row of the table, in id order.
    pub async fn list_all<T: Entity>(store: &dyn Store) -> Result<Vec<T>, StoreError> {
        Self::find_many(store, &Query::new()).await
    }

    /// Insert a row from a create DTO, returning the stored row.
    pub async fn insert<T: Entity, D: Serialize>(
        store: &dyn Store,
        dto: &D,
    ) -> Result<T, StoreError> {
        let record = encode(T::TABLE, dto)?;
        decode(store.insert(T::TABLE, record).await?)
    }

    /// Apply an update DTO; `None` when the row does not exist.
    pub async fn update<T: Entity, D: Serialize>(
        store: &dyn Store,
        id: DbId,
        dto: &D,
    ) -> Result<Option<T>, StoreError> {
        let patch = encode(T::TABLE, dto)?;
        store
            .update(T::TABLE, id, patch)
            .await?
            .map(decode::<T>)
            .transpose()
    }

    /// Set a single column, e.g. `estado`.
    pub async fn set_field<T: Entity>(
        store: &dyn Store,
        id: DbId,
        column: &str,
        value: Value,
    ) -> Result<Option<T>, StoreError> {
        let mut patch = Record::new();
        patch.insert(column.to_string(), value);
        store
            .update(T::TABLE, id, patch)
            .await?
            .map(decode::<T>)
            .transpose()
    }

    /// Delete by primary key. Returns `true` if a row was removed.
    pub async fn delete<T: Entity>(store: &dyn Store, id: DbId) -> Result<bool, StoreError> {
        store.delete(T::TABLE, id).await
    }

    /// Whether any row of `table` matches `filter`. Reads at most one row.
    pub async fn exists(
        store: &dyn Store,
        table: Table,
        filter: Filter,
    ) -> Result<bool, StoreError> {
        let rows = store.select(table, &Query::new().filter(filter).limit(1)).await?;
        Ok(!rows.is_empty())
    }
}

/// Serialize a DTO into a store record.
pub fn encode<D: Serialize>(table: Table, dto: &D) -> Result<Record, StoreError> {
    match serde_json::to_value(dto) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::Decode {
            table: table.name(),
            message: format!("expected an object to write, got {other}"),
        }),
        Err(e) => Err(StoreError::Decode {
            table: table.name(),
            message: e.to_string(),
        }),
    }
}

/// Deserialize a store record into its model.
pub fn decode<T: Entity>(record: Record) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(record)).map_err(|e| StoreError::Decode {
        table: T::TABLE.name(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStore;
    use crate::models::client::{Client, CreateClient, UpdateClient};
    use assert_matches::assert_matches;
    use mediabuy_core::status::ClientStatus;

    fn acme() -> CreateClient {
        CreateClient {
            nombre: "Acme".into(),
            rut: Some("12.345.678-5".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn insert_then_find_round_trips_the_model() {
        let store = MemoryStore::new();
        let created: Client = EntityRepo::insert(&store, &acme()).await.unwrap();
        assert_eq!(created.nombre, "Acme");
        assert_eq!(created.estado, ClientStatus::Activo);
        assert_eq!(created.email, None);

        let found = EntityRepo::find_by_id::<Client>(&store, created.id).await.unwrap();
        assert_eq!(found, Some(created));
    }

    #[tokio::test]
    async fn update_patch_leaves_unset_fields_alone() {
        let store = MemoryStore::new();
        let created: Client = EntityRepo::insert(&store, &acme()).await.unwrap();
        let patch = UpdateClient {
            ciudad: Some("Santiago".into()),
            ..Default::default()
        };
        let updated = EntityRepo::update::<Client, _>(&store, created.id, &patch)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.ciudad.as_deref(), Some("Santiago"));
        assert_eq!(updated.rut.as_deref(), Some("12.345.678-5"));
    }

    #[tokio::test]
    async fn exists_checks_for_any_matching_row() {
        let store = MemoryStore::new();
        EntityRepo::insert::<Client, _>(&store, &acme()).await.unwrap();
        assert!(EntityRepo::exists(&store, Table::Clients, Filter::eq("nombre", "Acme"))
            .await
            .unwrap());
        assert!(!EntityRepo::exists(&store, Table::Clients, Filter::eq("nombre", "Zeta"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn undecodable_rows_are_reported_with_their_table() {
        let store = MemoryStore::new();
        let mut record = Record::new();
        record.insert("nombre".into(), Value::from("Acme"));
        record.insert("estado".into(), Value::from("desconocido"));
        let stored = store.insert(Table::Clients, record).await.unwrap();
        let id = stored["id"].as_i64().unwrap();

        let err = EntityRepo::find_by_id::<Client>(&store, id).await.unwrap_err();
        assert_matches!(err, StoreError::Decode { table: "clientes", .. });
    }
}
