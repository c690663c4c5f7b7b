//! PostgreSQL [`Store`] over a sqlx pool.
//!
//! Rows are read with `to_jsonb(t)` so one code path serves every table.
//! Writes go through `jsonb_populate_record`, which casts each JSON field to
//! its column type.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::types::Json;
use sqlx::Postgres;

use mediabuy_core::types::{Date, DbId};

use crate::store::{check_column, FieldValue, Filter, Query, Record, Store, StoreError, Table};
use crate::DbPool;

/// Columns the store manages itself; never taken from caller records.
const MANAGED_COLUMNS: &[&str] = &["id", "created_at", "updated_at"];

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Record>, StoreError> {
        let (where_clause, bind_values, bind_idx) = build_filter(&query.filters)?;

        let order_clause = match query.order_by {
            Some(order) => {
                check_column(order.column)?;
                let dir = if order.ascending { "ASC" } else { "DESC" };
                format!("ORDER BY t.{} {dir} NULLS LAST, t.id ASC", order.column)
            }
            None => "ORDER BY t.id ASC".to_string(),
        };

        let mut sql = format!("SELECT to_jsonb(t) FROM {table} t {where_clause} {order_clause}");
        if query.limit.is_some() {
            sql.push_str(&format!(" LIMIT ${bind_idx} OFFSET ${}", bind_idx + 1));
        } else if query.offset > 0 {
            sql.push_str(&format!(" OFFSET ${bind_idx}"));
        }
        tracing::debug!(table = %table, sql = %sql, "store select");

        let mut q = bind_values_scalar(sqlx::query_scalar::<_, Value>(&sql), &bind_values);
        if let Some(limit) = query.limit {
            q = q.bind(limit).bind(query.offset);
        } else if query.offset > 0 {
            q = q.bind(query.offset);
        }

        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(|row| into_record(table, row)).collect()
    }

    async fn insert(&self, table: Table, record: Record) -> Result<Record, StoreError> {
        let columns = writable_columns(&record)?;

        let sql = if columns.is_empty() {
            format!("INSERT INTO {table} AS t DEFAULT VALUES RETURNING to_jsonb(t)")
        } else {
            let cols = columns.join(", ");
            format!(
                "INSERT INTO {table} AS t ({cols}) \
                 SELECT {cols} FROM jsonb_populate_record(NULL::{table}, $1) \
                 RETURNING to_jsonb(t)"
            )
        };

        let row = sqlx::query_scalar::<_, Value>(&sql)
            .bind(Json(Value::Object(record)))
            .fetch_one(&self.pool)
            .await?;
        into_record(table, row)
    }

    async fn update(
        &self,
        table: Table,
        id: DbId,
        patch: Record,
    ) -> Result<Option<Record>, StoreError> {
        let columns = writable_columns(&patch)?;

        let mut sets: Vec<String> = columns.iter().map(|c| format!("{c} = r.{c}")).collect();
        sets.push("updated_at = NOW()".to_string());

        let sql = format!(
            "UPDATE {table} AS t SET {} \
             FROM jsonb_populate_record(NULL::{table}, $1) AS r \
             WHERE t.id = $2 \
             RETURNING to_jsonb(t)",
            sets.join(", ")
        );

        let row = sqlx::query_scalar::<_, Value>(&sql)
            .bind(Json(Value::Object(patch)))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| into_record(table, r)).transpose()
    }

    async fn delete(&self, table: Table, id: DbId) -> Result<bool, StoreError> {
        let sql = format!("DELETE FROM {table} WHERE id = $1");
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

// ---------------------------------------------------------------------------
// Internal helpers for dynamic query building
// ---------------------------------------------------------------------------

/// Typed bind value for dynamically-built queries.
enum BindValue {
    BigInt(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Date(Date),
}

impl From<&FieldValue> for BindValue {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Int(v) => BindValue::BigInt(*v),
            FieldValue::Float(v) => BindValue::Float(*v),
            FieldValue::Text(v) => BindValue::Text(v.clone()),
            FieldValue::Bool(v) => BindValue::Bool(*v),
            FieldValue::Date(v) => BindValue::Date(*v),
        }
    }
}

/// Escape `LIKE` metacharacters so user text matches literally.
fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Build a WHERE clause and bind values from filters.
///
/// Returns `(where_clause, bind_values, next_bind_index)`.
/// The `where_clause` is empty if there are no filters, or starts with `WHERE `.
fn build_filter(filters: &[Filter]) -> Result<(String, Vec<BindValue>, u32), StoreError> {
    let mut conditions: Vec<String> = Vec::new();
    let mut bind_idx = 1u32;
    let mut bind_values: Vec<BindValue> = Vec::new();

    for filter in filters {
        let column = filter.column();
        check_column(column)?;

        match filter {
            Filter::Eq(_, value) => {
                conditions.push(format!("t.{column} = ${bind_idx}"));
                bind_idx += 1;
                bind_values.push(value.into());
            }
            Filter::ILike(_, text) => {
                conditions.push(format!("t.{column} ILIKE ${bind_idx}"));
                bind_idx += 1;
                bind_values.push(BindValue::Text(format!("%{}%", escape_like(text))));
            }
            Filter::Gte(_, value) => {
                conditions.push(format!("t.{column} >= ${bind_idx}"));
                bind_idx += 1;
                bind_values.push(value.into());
            }
            Filter::Lte(_, value) => {
                conditions.push(format!("t.{column} <= ${bind_idx}"));
                bind_idx += 1;
                bind_values.push(value.into());
            }
            Filter::In(_, values) if values.is_empty() => {
                conditions.push("FALSE".to_string());
            }
            Filter::In(_, values) => {
                let placeholders: Vec<String> = values
                    .iter()
                    .map(|v| {
                        let p = format!("${bind_idx}");
                        bind_idx += 1;
                        bind_values.push(v.into());
                        p
                    })
                    .collect();
                conditions.push(format!("t.{column} IN ({})", placeholders.join(", ")));
            }
            Filter::Prefix(_, prefix) => {
                conditions.push(format!("t.{column} LIKE ${bind_idx}"));
                bind_idx += 1;
                bind_values.push(BindValue::Text(format!("{}%", escape_like(prefix))));
            }
        }
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    Ok((where_clause, bind_values, bind_idx))
}

/// Bind a slice of `BindValue` to a sqlx `QueryScalar`.
fn bind_values_scalar<'q>(
    mut q: sqlx::query::QueryScalar<'q, Postgres, Value, PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryScalar<'q, Postgres, Value, PgArguments> {
    for val in bind_values {
        match val {
            BindValue::BigInt(v) => q = q.bind(*v),
            BindValue::Float(v) => q = q.bind(*v),
            BindValue::Text(v) => q = q.bind(v.as_str()),
            BindValue::Bool(v) => q = q.bind(*v),
            BindValue::Date(v) => q = q.bind(*v),
        }
    }
    q
}

/// Caller-supplied columns, validated, minus the store-managed ones.
fn writable_columns(record: &Record) -> Result<Vec<&str>, StoreError> {
    let mut columns = Vec::with_capacity(record.len());
    for key in record.keys() {
        if MANAGED_COLUMNS.contains(&key.as_str()) {
            continue;
        }
        check_column(key)?;
        columns.push(key.as_str());
    }
    Ok(columns)
}

fn into_record(table: Table, row: Value) -> Result<Record, StoreError> {
    match row {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Decode {
            table: table.name(),
            message: format!("expected a JSON object, got {other}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_numbers_placeholders_in_order() {
        let filters = vec![
            Filter::eq("estado", "activo"),
            Filter::ILike("nombre", "acme".into()),
            Filter::In("id", vec![FieldValue::Int(1), FieldValue::Int(2)]),
        ];
        let (clause, binds, next) = build_filter(&filters).unwrap();
        assert_eq!(
            clause,
            "WHERE t.estado = $1 AND t.nombre ILIKE $2 AND t.id IN ($3, $4)"
        );
        assert_eq!(binds.len(), 4);
        assert_eq!(next, 5);
    }

    #[test]
    fn empty_membership_matches_nothing() {
        let (clause, binds, next) = build_filter(&[Filter::In("id", vec![])]).unwrap();
        assert_eq!(clause, "WHERE FALSE");
        assert!(binds.is_empty());
        assert_eq!(next, 1);
    }

    #[test]
    fn no_filters_yield_empty_clause() {
        let (clause, _, next) = build_filter(&[]).unwrap();
        assert!(clause.is_empty());
        assert_eq!(next, 1);
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[test]
    fn managed_columns_are_not_written() {
        let mut record = Record::new();
        record.insert("id".into(), Value::from(9));
        record.insert("nombre".into(), Value::from("Acme"));
        assert_eq!(writable_columns(&record).unwrap(), vec!["nombre"]);

        record.insert("bad col".into(), Value::Null);
        assert!(writable_columns(&record).is_err());
    }
}
