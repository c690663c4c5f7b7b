//! Registry introspection for callers deciding what they may invoke.

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::engine::{HandlerKind, IntentDescriptor};
use crate::envelope::{ActionError, Envelope};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct IntentionListParams {
    pub handler: Option<String>,
}

#[derive(Serialize)]
pub struct IntentionList<'a> {
    pub data: Vec<&'a IntentDescriptor>,
    pub count: usize,
}

/// GET /api/v1/intentions
///
/// All descriptors, or those of one handler with `?handler=`.
pub async fn list_intentions(
    State(state): State<AppState>,
    Query(params): Query<IntentionListParams>,
) -> Response {
    let registry = state.dispatcher.registry();
    let data: Vec<&IntentDescriptor> = match params.handler.as_deref() {
        None => registry.all().iter().collect(),
        Some(raw) => match HandlerKind::parse(raw) {
            Some(kind) => registry.by_handler(kind),
            None => {
                let allowed: Vec<&str> = HandlerKind::ALL.iter().map(|k| k.as_str()).collect();
                return Envelope::Failure(ActionError::invalid(format!(
                    "Unknown handler '{raw}'. Must be one of: {}",
                    allowed.join(", ")
                )))
                .into_response();
            }
        },
    };

    let count = data.len();
    Json(IntentionList { data, count }).into_response()
}

/// GET /api/v1/intentions/{name}
pub async fn get_intention(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.dispatcher.registry().get(&name) {
        Some(descriptor) => Json(descriptor).into_response(),
        None => Envelope::Failure(ActionError::unknown_intention(&name)).into_response(),
    }
}
