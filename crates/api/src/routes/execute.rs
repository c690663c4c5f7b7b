//! The HTTP face of `execute_intention`.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::envelope::{ActionError, Envelope};
use crate::params::Params;
use crate::state::AppState;

/// Body of `POST /api/v1/execute`.
#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub intention: String,
    #[serde(default)]
    pub params: Option<Params>,
}

/// POST /api/v1/execute
///
/// Responds with the envelope; the HTTP status mirrors its code. A body
/// that is not a valid request is reported as `VALIDATION_ERROR`.
pub async fn execute(
    State(state): State<AppState>,
    body: Result<Json<ExecuteRequest>, JsonRejection>,
) -> Envelope {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return Envelope::Failure(ActionError::invalid(format!(
                "Invalid request body: {}",
                rejection.body_text()
            )))
        }
    };

    state
        .dispatcher
        .execute_intention(&request.intention, request.params.unwrap_or_default())
        .await
}
