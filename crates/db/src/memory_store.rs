//! In-process [`Store`] used by tests and the `memory` backend.
//!
//! Mirrors the PostgreSQL store's observable behavior: server-assigned ids
//! and timestamps, the same filter semantics, `NULLS LAST` ordering with an
//! `id` tiebreak, and the unique `ordenes.numero_orden` rule. Every call is
//! counted so tests can assert that a request never reached persistence.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use tokio::sync::RwLock;

use mediabuy_core::types::DbId;

use crate::store::{Filter, Query, Record, Store, StoreError, Table};

/// `(table, column)` pairs that must hold unique non-null values.
const UNIQUE_COLUMNS: &[(Table, &str)] = &[(Table::Orders, "numero_orden")];

#[derive(Default)]
struct Tables {
    rows: HashMap<Table, BTreeMap<DbId, Record>>,
    last_id: HashMap<Table, DbId>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    operations: AtomicU64,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store calls made so far.
    pub fn operation_count(&self) -> u64 {
        self.operations.load(AtomicOrdering::SeqCst)
    }

    /// While set, every call fails with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, AtomicOrdering::SeqCst);
    }

    /// Rows currently held in `table`. Not counted as an operation.
    pub async fn row_count(&self, table: Table) -> usize {
        let tables = self.tables.read().await;
        tables.rows.get(&table).map_or(0, BTreeMap::len)
    }

    fn begin(&self) -> Result<(), StoreError> {
        self.operations.fetch_add(1, AtomicOrdering::SeqCst);
        if self.unavailable.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Record>, StoreError> {
        self.begin()?;
        let tables = self.tables.read().await;
        let Some(rows) = tables.rows.get(&table) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<&Record> = rows
            .values()
            .filter(|r| query.filters.iter().all(|f| matches_filter(r, f)))
            .collect();

        if let Some(order) = query.order_by {
            matched.sort_by(|a, b| {
                compare_for_sort(a.get(order.column), b.get(order.column), order.ascending)
                    .then_with(|| record_id(a).cmp(&record_id(b)))
            });
        }

        let offset = usize::try_from(query.offset.max(0)).unwrap_or(usize::MAX);
        let limit = query
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l.max(0)).unwrap_or(usize::MAX));

        Ok(matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn insert(&self, table: Table, mut record: Record) -> Result<Record, StoreError> {
        self.begin()?;
        let mut tables = self.tables.write().await;
        strip_managed(&mut record);
        check_unique(&tables, table, None, &record)?;

        let id = {
            let last = tables.last_id.entry(table).or_insert(0);
            *last += 1;
            *last
        };
        let now = now_text();
        record.insert("id".into(), Value::from(id));
        record.insert("created_at".into(), Value::from(now.clone()));
        record.insert("updated_at".into(), Value::from(now));

        tables
            .rows
            .entry(table)
            .or_default()
            .insert(id, record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        table: Table,
        id: DbId,
        mut patch: Record,
    ) -> Result<Option<Record>, StoreError> {
        self.begin()?;
        let mut tables = self.tables.write().await;
        strip_managed(&mut patch);

        let Some(current) = tables.rows.get(&table).and_then(|rows| rows.get(&id)) else {
            return Ok(None);
        };
        let mut merged = current.clone();
        merged.extend(patch);
        check_unique(&tables, table, Some(id), &merged)?;
        merged.insert("updated_at".into(), Value::from(now_text()));

        tables
            .rows
            .entry(table)
            .or_default()
            .insert(id, merged.clone());
        Ok(Some(merged))
    }

    async fn delete(&self, table: Table, id: DbId) -> Result<bool, StoreError> {
        self.begin()?;
        let mut tables = self.tables.write().await;
        Ok(tables
            .rows
            .get_mut(&table)
            .and_then(|rows| rows.remove(&id))
            .is_some())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.begin()
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

fn now_text() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn strip_managed(record: &mut Record) {
    for key in ["id", "created_at", "updated_at"] {
        record.remove(key);
    }
}

fn record_id(record: &Record) -> i64 {
    record.get("id").and_then(Value::as_i64).unwrap_or(0)
}

fn check_unique(
    tables: &Tables,
    table: Table,
    own_id: Option<DbId>,
    record: &Record,
) -> Result<(), StoreError> {
    let Some(rows) = tables.rows.get(&table) else {
        return Ok(());
    };
    for (_, column) in UNIQUE_COLUMNS.iter().filter(|(t, _)| *t == table) {
        let Some(value) = record.get(*column).filter(|v| !v.is_null()) else {
            continue;
        };
        let taken = rows
            .iter()
            .any(|(id, row)| Some(*id) != own_id && row.get(*column) == Some(value));
        if taken {
            return Err(StoreError::Constraint(format!(
                "duplicate value {value} for {table}.{column}"
            )));
        }
    }
    Ok(())
}

/// Order two stored values: numbers numerically, text lexically (which
/// also orders ISO dates and timestamps). Mixed or null operands don't
/// compare.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::String(y)) => x.as_f64()?.partial_cmp(&y.parse::<f64>().ok()?),
        (Value::String(x), Value::Number(y)) => x.parse::<f64>().ok()?.partial_cmp(&y.as_f64()?),
        _ => None,
    }
}

fn compare_for_sort(a: Option<&Value>, b: Option<&Value>, ascending: bool) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => {
            let ord = compare_values(x, y).unwrap_or(Ordering::Equal);
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        }
    }
}

fn matches_filter(record: &Record, filter: &Filter) -> bool {
    let Some(value) = record.get(filter.column()).filter(|v| !v.is_null()) else {
        return false;
    };
    match filter {
        Filter::Eq(_, expected) => {
            compare_values(value, &expected.to_json()) == Some(Ordering::Equal)
        }
        Filter::ILike(_, needle) => value
            .as_str()
            .is_some_and(|s| s.to_lowercase().contains(&needle.to_lowercase())),
        Filter::Gte(_, bound) => matches!(
            compare_values(value, &bound.to_json()),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Filter::Lte(_, bound) => matches!(
            compare_values(value, &bound.to_json()),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Filter::In(_, set) => set
            .iter()
            .any(|v| compare_values(value, &v.to_json()) == Some(Ordering::Equal)),
        Filter::Prefix(_, prefix) => value.as_str().is_some_and(|s| s.starts_with(prefix.as_str())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FieldValue;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for (nombre, costo, tipo) in [
            ("Canal 13", 1500.0, "television"),
            ("Radio Bio Bio", 300.0, "radio"),
            ("El Mercurio", 800.0, "prensa"),
            ("Radio Cooperativa", 250.0, "radio"),
        ] {
            store
                .insert(
                    Table::Media,
                    record(json!({"nombre": nombre, "costo": costo, "tipo": tipo})),
                )
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn insert_assigns_ids_and_timestamps() {
        let store = MemoryStore::new();
        let a = store
            .insert(Table::Clients, record(json!({"nombre": "Acme", "id": 99})))
            .await
            .unwrap();
        let b = store
            .insert(Table::Clients, record(json!({"nombre": "Beta"})))
            .await
            .unwrap();
        assert_eq!(a["id"], 1);
        assert_eq!(b["id"], 2);
        assert!(a["created_at"].is_string());
        assert_eq!(a["created_at"], a["updated_at"]);
    }

    #[tokio::test]
    async fn filters_combine_conjunctively() {
        let store = seeded().await;
        let query = Query::new()
            .filter(Filter::ILike("nombre", "RADIO".into()))
            .filter(Filter::Gte("costo", FieldValue::Float(260.0)));
        let rows = store.select(Table::Media, &query).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["nombre"], "Radio Bio Bio");
    }

    #[tokio::test]
    async fn membership_and_equality() {
        let store = seeded().await;
        let query = Query::new().filter(Filter::In(
            "tipo",
            vec!["radio".into(), "prensa".into()],
        ));
        assert_eq!(store.select(Table::Media, &query).await.unwrap().len(), 3);

        let query = Query::new().filter(Filter::eq("tipo", "Radio"));
        assert!(store.select(Table::Media, &query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ordering_and_pagination() {
        let store = seeded().await;
        let query = Query::new().order_by("costo", false).limit(2).offset(1);
        let rows = store.select(Table::Media, &query).await.unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r["nombre"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["El Mercurio", "Radio Bio Bio"]);
    }

    #[tokio::test]
    async fn nulls_sort_last_in_both_directions() {
        let store = seeded().await;
        store
            .insert(Table::Media, record(json!({"nombre": "Sin costo"})))
            .await
            .unwrap();
        for ascending in [true, false] {
            let rows = store
                .select(Table::Media, &Query::new().order_by("costo", ascending))
                .await
                .unwrap();
            assert_eq!(rows.last().unwrap()["nombre"], "Sin costo");
        }
    }

    #[tokio::test]
    async fn update_merges_and_delete_removes() {
        let store = seeded().await;
        let updated = store
            .update(Table::Media, 2, record(json!({"costo": 350.0})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["costo"], 350.0);
        assert_eq!(updated["nombre"], "Radio Bio Bio");

        assert!(store.update(Table::Media, 42, Record::new()).await.unwrap().is_none());
        assert!(store.delete(Table::Media, 2).await.unwrap());
        assert!(!store.delete(Table::Media, 2).await.unwrap());
        assert_eq!(store.row_count(Table::Media).await, 3);
    }

    #[tokio::test]
    async fn order_numbers_are_unique() {
        let store = MemoryStore::new();
        store
            .insert(Table::Orders, record(json!({"numero_orden": "ORD-20261016-0001"})))
            .await
            .unwrap();
        let err = store
            .insert(Table::Orders, record(json!({"numero_orden": "ORD-20261016-0001"})))
            .await
            .unwrap_err();
        assert_matches!(err, StoreError::Constraint(_));
    }

    #[tokio::test]
    async fn unavailable_store_fails_and_counts_calls() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert_matches!(
            store.select(Table::Clients, &Query::new()).await,
            Err(StoreError::Unavailable(_))
        );
        assert_eq!(store.operation_count(), 1);
    }
}
