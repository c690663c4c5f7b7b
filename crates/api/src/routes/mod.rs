pub mod execute;
pub mod health;
pub mod intentions;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// POST /execute                 run one intention
/// GET  /intentions              list descriptors (?handler=client)
/// GET  /intentions/{name}       one descriptor
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/execute", post(execute::execute))
        .route("/intentions", get(intentions::list_intentions))
        .route("/intentions/{name}", get(intentions::get_intention))
}
