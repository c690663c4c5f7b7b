//! The application router: the health probe, the `/api/v1` engine routes and
//! the middleware both the binary and the integration tests run behind.

use std::any::Any;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::map_response_body::MapResponseBodyLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::Level;

use crate::config::ServerConfig;
use crate::engine::dispatcher::panic_message;
use crate::envelope::{ActionError, Envelope};
use crate::routes;
use crate::state::AppState;

/// Header carrying the per-request id, set when absent and echoed back.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Largest accepted request body. Intent params are small JSON objects.
pub const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

/// Build the full application [`Router`].
///
/// Layers run outermost first: CORS, request id assignment, tracing, request
/// id propagation, timeout, then panic recovery around the routes.
pub fn build_app_router(state: AppState, config: &ServerConfig) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let middleware = ServiceBuilder::new()
        .layer(build_cors_layer(config))
        .layer(MapResponseBodyLayer::new(axum::body::Body::new))
        .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
        .layer(PropagateRequestIdLayer::new(request_id))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(CatchPanicLayer::custom(panic_response));

    Router::new()
        .merge(routes::health::router())
        .nest(
            "/api/v1",
            routes::api_routes().layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES)),
        )
        .layer(middleware)
        .with_state(state)
}

/// A panic outside the dispatcher still answers with a failure envelope.
fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic_message(payload);
    tracing::error!(error = %message, "Request handler panicked");
    Envelope::Failure(ActionError::execution(format!(
        "Unexpected failure while handling the request: {message}"
    )))
    .into_response()
}

/// CORS for the configured origins. The engine only takes JSON posts and
/// introspection gets; the request id is exposed to browser callers.
///
/// An origin that is not a valid header value aborts startup.
pub fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|origin| {
            origin
                .parse()
                .unwrap_or_else(|e| panic!("CORS_ORIGINS entry '{origin}' is invalid: {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
        .max_age(Duration::from_secs(3600))
}
