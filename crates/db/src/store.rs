//! The persistence contract the action handlers are written against.
//!
//! Records travel as JSON objects keyed by column name. A [`Query`] carries
//! conjunctive filters, one ordering column and offset/limit pagination;
//! nothing here needs joins, transactions or triggers.

use async_trait::async_trait;
use serde_json::Value;

use mediabuy_core::types::{Date, DbId};

/// A row as a JSON object keyed by column name.
pub type Record = serde_json::Map<String, Value>;

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Every table the engine reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Clients,
    Providers,
    Media,
    Themes,
    Campaigns,
    CampaignThemes,
    Plans,
    Orders,
    OrderDetails,
}

impl Table {
    pub const ALL: &'static [Table] = &[
        Table::Clients,
        Table::Providers,
        Table::Media,
        Table::Themes,
        Table::Campaigns,
        Table::CampaignThemes,
        Table::Plans,
        Table::Orders,
        Table::OrderDetails,
    ];

    /// SQL table name.
    pub fn name(self) -> &'static str {
        match self {
            Table::Clients => "clientes",
            Table::Providers => "proveedores",
            Table::Media => "medios",
            Table::Themes => "temas",
            Table::Campaigns => "campanias",
            Table::CampaignThemes => "campania_temas",
            Table::Plans => "planes",
            Table::Orders => "ordenes",
            Table::OrderDetails => "detalles_orden",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Filters and queries
// ---------------------------------------------------------------------------

/// A typed value compared against a column.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Date(Date),
}

impl FieldValue {
    /// JSON form, matching how the value is stored in a [`Record`].
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Int(v) => Value::from(*v),
            FieldValue::Float(v) => Value::from(*v),
            FieldValue::Text(v) => Value::from(v.as_str()),
            FieldValue::Bool(v) => Value::from(*v),
            FieldValue::Date(v) => Value::from(v.format("%Y-%m-%d").to_string()),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<Date> for FieldValue {
    fn from(v: Date) -> Self {
        FieldValue::Date(v)
    }
}

/// One condition on a column. All filters of a query must hold.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(&'static str, FieldValue),
    /// Case-insensitive substring match.
    ILike(&'static str, String),
    Gte(&'static str, FieldValue),
    Lte(&'static str, FieldValue),
    /// Set membership. An empty set matches nothing.
    In(&'static str, Vec<FieldValue>),
    /// Case-sensitive prefix match.
    Prefix(&'static str, String),
}

impl Filter {
    pub fn eq(column: &'static str, value: impl Into<FieldValue>) -> Self {
        Filter::Eq(column, value.into())
    }

    pub fn column(&self) -> &'static str {
        match self {
            Filter::Eq(c, _)
            | Filter::ILike(c, _)
            | Filter::Gte(c, _)
            | Filter::Lte(c, _)
            | Filter::In(c, _)
            | Filter::Prefix(c, _) => c,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
    pub ascending: bool,
}

/// Filtered, ordered, paginated read of one table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    /// `None` reads every matching row.
    pub limit: Option<i64>,
    pub offset: i64,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-row lookup by primary key.
    pub fn by_id(id: DbId) -> Self {
        Self::new().filter(Filter::eq("id", id)).limit(1)
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, column: &'static str, ascending: bool) -> Self {
        self.order_by = Some(OrderBy { column, ascending });
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be read into its model.
    #[error("Could not decode {table} record: {message}")]
    Decode { table: &'static str, message: String },

    #[error("Invalid column name '{0}'")]
    InvalidColumn(String),

    /// A uniqueness rule was violated by an in-memory write.
    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Column names are interpolated into SQL, so only plain lowercase
/// identifiers are accepted.
pub fn check_column(name: &str) -> Result<(), StoreError> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidColumn(name.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// Table-level persistence used by every handler.
///
/// Implementations assign `id`, `created_at` and `updated_at` on insert and
/// refresh `updated_at` on update. Each call stands alone; there are no
/// transactions spanning calls.
#[async_trait]
pub trait Store: Send + Sync {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Record>, StoreError>;

    async fn insert(&self, table: Table, record: Record) -> Result<Record, StoreError>;

    /// Apply `patch` to the row with `id`; `None` when no such row exists.
    async fn update(
        &self,
        table: Table,
        id: DbId,
        patch: Record,
    ) -> Result<Option<Record>, StoreError>;

    /// Delete by primary key; `false` when no such row existed.
    async fn delete(&self, table: Table, id: DbId) -> Result<bool, StoreError>;

    /// Confirm the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;
}
