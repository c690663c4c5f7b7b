//! Persistence layer for the action engine.
//!
//! Handlers talk to a [`Store`](store::Store): table-level filtered select,
//! insert, update and delete over JSON records. [`PgStore`](pg_store::PgStore)
//! backs it with PostgreSQL; [`MemoryStore`](memory_store::MemoryStore) keeps
//! everything in process for tests and the `memory` backend. Typed models and
//! per-entity repositories sit on top.

use sqlx::postgres::PgPoolOptions;

pub mod memory_store;
pub mod models;
pub mod pg_store;
pub mod repositories;
pub mod store;

pub use memory_store::MemoryStore;
pub use pg_store::PgStore;
pub use store::{FieldValue, Filter, OrderBy, Query, Record, Store, StoreError, Table};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded migrations in `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
