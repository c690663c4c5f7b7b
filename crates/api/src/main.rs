use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediabuy_api::config::{LogFormat, ServerConfig, StoreBackend};
use mediabuy_api::router::build_app_router;
use mediabuy_api::state::AppState;
use mediabuy_db::{MemoryStore, PgStore, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env().context("Invalid server configuration")?;

    // --- Tracing ---
    init_tracing(config.log_format);
    tracing::info!(
        host = %config.host,
        port = %config.port,
        store = ?config.store_backend,
        "Loaded server configuration"
    );

    // --- Store ---
    let store = connect_store(&config).await?;

    // --- App state ---
    let state = AppState::new(Arc::clone(&store), config.clone())
        .context("Intent registry failed validation")?;
    tracing::info!(
        intents = state.dispatcher.registry().len(),
        "Action engine ready"
    );

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().context("Invalid HOST address")?,
        config.port,
    );
    tracing::info!(%addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mediabuy_api=debug,tower_http=debug".into());

    match format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

/// Open the configured store. Postgres is pinged and migrated first.
async fn connect_store(config: &ServerConfig) -> anyhow::Result<Arc<dyn Store>> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set")?;

            let pool = mediabuy_db::create_pool(database_url, config.db_max_connections)
                .await
                .context("Failed to connect to database")?;
            tracing::info!(max_connections = config.db_max_connections, "Postgres pool ready");

            mediabuy_db::health_check(&pool)
                .await
                .context("Database health check failed")?;

            mediabuy_db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Migrations up to date");

            Ok(Arc::new(PgStore::new(pool)))
        }
    }
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM. In-flight intents finish
/// before the listener closes.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Ctrl-C handler could not be installed");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler could not be installed")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!(signal = "SIGINT", "Shutting down");
        }
        () = terminate => {
            tracing::info!(signal = "SIGTERM", "Shutting down");
        }
    }
}
