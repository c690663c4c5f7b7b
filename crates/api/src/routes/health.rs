use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Liveness and readiness summary for load balancers and operators.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` when the store answers, `degraded` otherwise.
    pub status: &'static str,
    pub version: &'static str,
    /// Active store backend (`postgres` or `memory`).
    pub store: &'static str,
    pub db_healthy: bool,
    /// Intents the dispatcher can resolve.
    pub intents: usize,
}

/// GET /health
///
/// Always 200; a store outage shows up as `degraded` so the engine's own
/// failures stay distinguishable from an unreachable process.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = match state.store.ping().await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(error = %err, backend = state.store.backend(), "Store ping failed");
            false
        }
    };

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        store: state.store.backend(),
        db_healthy,
        intents: state.dispatcher.registry().len(),
    })
}

/// Root-level health route; kept outside `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
