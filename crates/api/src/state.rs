use std::sync::Arc;

use mediabuy_db::Store;

use crate::config::ServerConfig;
use crate::engine::Dispatcher;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// The action engine.
    pub dispatcher: Arc<Dispatcher>,
    /// Store the dispatcher's handlers write through; used for health checks.
    pub store: Arc<dyn Store>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Build the state with every handler wired to `store`.
    pub fn new(
        store: Arc<dyn Store>,
        config: ServerConfig,
    ) -> Result<Self, crate::engine::RegistryError> {
        let dispatcher = Dispatcher::new(Arc::clone(&store), config.engine)?;
        Ok(Self {
            dispatcher: Arc::new(dispatcher),
            store,
            config: Arc::new(config),
        })
    }
}
