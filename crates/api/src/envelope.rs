//! The result envelope every engine operation produces.
//!
//! Handlers return [`ActionResult`]; the dispatcher wraps it into an
//! [`Envelope`] whose JSON form is either
//! `{ success: true, data, message?, count? }` or
//! `{ success: false, error, code, ...diagnostics }`. Callers branch on
//! `success` alone.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Serialize, Serializer};
use serde_json::Value;

use mediabuy_core::error::CoreError;
use mediabuy_db::StoreError;

// ---------------------------------------------------------------------------
// Error kinds
// ---------------------------------------------------------------------------

/// Machine-readable failure code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    // Dispatcher, before any handler runs.
    UnknownIntention,
    HandlerNotFound,
    MissingParams,
    // Business rules.
    ValidationError,
    InvalidState,
    InvalidPriority,
    HasDependencies,
    NotFound,
    // Persistence or unexpected failures.
    DatabaseError,
    Exception,
    ExecutionError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::UnknownIntention => "UNKNOWN_INTENTION",
            ErrorKind::HandlerNotFound => "HANDLER_NOT_FOUND",
            ErrorKind::MissingParams => "MISSING_PARAMS",
            ErrorKind::ValidationError => "VALIDATION_ERROR",
            ErrorKind::InvalidState => "INVALID_STATE",
            ErrorKind::InvalidPriority => "INVALID_PRIORITY",
            ErrorKind::HasDependencies => "HAS_DEPENDENCIES",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::DatabaseError => "DATABASE_ERROR",
            ErrorKind::Exception => "EXCEPTION",
            ErrorKind::ExecutionError => "EXECUTION_ERROR",
        }
    }

    /// HTTP status used when the envelope is returned over HTTP.
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::MissingParams
            | ErrorKind::ValidationError
            | ErrorKind::InvalidState
            | ErrorKind::InvalidPriority => StatusCode::BAD_REQUEST,
            ErrorKind::UnknownIntention | ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::HasDependencies => StatusCode::CONFLICT,
            ErrorKind::HandlerNotFound => StatusCode::NOT_IMPLEMENTED,
            ErrorKind::DatabaseError | ErrorKind::Exception | ErrorKind::ExecutionError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether the failure came from a business rule rather than a fault.
    pub fn is_rejection(self) -> bool {
        self.status_code().is_client_error()
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Failure
// ---------------------------------------------------------------------------

/// Optional fields attached to a failure payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_params: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_dependencies: Option<bool>,
    /// Per-table dependency flags such as `hasOrders`.
    #[serde(flatten)]
    pub dependents: BTreeMap<String, bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_state: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,
}

/// A failed operation: kind, display-safe message, diagnostics.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ActionError {
    pub kind: ErrorKind,
    pub message: String,
    pub diagnostics: Diagnostics,
}

impl ActionError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn unknown_intention(name: &str) -> Self {
        Self::new(ErrorKind::UnknownIntention, format!("Unknown intention '{name}'"))
    }

    pub fn handler_not_found(handler: &str, intention: &str) -> Self {
        Self::new(
            ErrorKind::HandlerNotFound,
            format!("No {handler} handler is registered to run '{intention}'"),
        )
    }

    pub fn missing_params(missing: Vec<String>) -> Self {
        let mut err = Self::new(
            ErrorKind::MissingParams,
            format!("Missing required parameters: {}", missing.join(", ")),
        );
        err.diagnostics.missing_params = missing;
        err
    }

    pub fn validation(errors: Vec<String>) -> Self {
        let mut err = Self::new(
            ErrorKind::ValidationError,
            format!("Validation failed: {}", errors.join("; ")),
        );
        err.diagnostics.errors = errors;
        err
    }

    /// Single-message validation failure.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::validation(vec![message.into()])
    }

    pub fn not_found(entity: &str, id: i64) -> Self {
        Self::new(ErrorKind::NotFound, format!("{entity} with id {id} not found"))
    }

    /// A value outside an enumerated state set.
    pub fn invalid_state(field: &str, value: &str, allowed: &[&str]) -> Self {
        let mut err = Self::new(
            ErrorKind::InvalidState,
            format!(
                "Invalid value '{value}' for {field}. Must be one of: {}",
                allowed.join(", ")
            ),
        );
        err.diagnostics.allowed_values = allowed.iter().map(|s| s.to_string()).collect();
        err
    }

    pub fn invalid_priority(value: &str, allowed: &[&str]) -> Self {
        let mut err = Self::new(
            ErrorKind::InvalidPriority,
            format!(
                "Invalid priority '{value}'. Must be one of: {}",
                allowed.join(", ")
            ),
        );
        err.diagnostics.allowed_values = allowed.iter().map(|s| s.to_string()).collect();
        err
    }

    /// The record's current state forbids the operation.
    pub fn blocked_by_state(message: impl Into<String>, current: &str) -> Self {
        let mut err = Self::new(ErrorKind::InvalidState, message);
        err.diagnostics.current_state = Some(current.to_string());
        err
    }

    /// Deletion refused because dependents exist. `flags` are the
    /// per-table keys, e.g. `("hasOrders", true)`.
    pub fn has_dependencies(entity: &str, id: i64, flags: &[(&str, bool)]) -> Self {
        let found: Vec<&str> = flags
            .iter()
            .filter(|(_, present)| *present)
            .map(|(key, _)| key.trim_start_matches("has"))
            .collect();
        let mut err = Self::new(
            ErrorKind::HasDependencies,
            format!(
                "{entity} with id {id} has dependent records ({}). Use force to delete anyway",
                found.join(", ").to_lowercase()
            ),
        );
        err.diagnostics.has_dependencies = Some(true);
        err.diagnostics.dependents = flags
            .iter()
            .map(|(key, present)| (key.to_string(), *present))
            .collect();
        err
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExecutionError, message)
    }
}

impl From<StoreError> for ActionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Decode { .. } => {
                tracing::error!(error = %err, "Malformed record from store");
                ActionError::new(ErrorKind::Exception, err.to_string())
            }
            other => {
                tracing::error!(error = %other, "Store call failed");
                ActionError::new(ErrorKind::DatabaseError, other.to_string())
            }
        }
    }
}

impl From<serde_json::Error> for ActionError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!(error = %err, "Payload could not be serialized");
        ActionError::new(ErrorKind::Exception, err.to_string())
    }
}

impl From<CoreError> for ActionError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(errors) => ActionError::validation(errors),
            CoreError::InvalidValue { field, value, allowed } => {
                ActionError::invalid_state(field, &value, &allowed)
            }
            CoreError::SequenceExhausted(_) => {
                ActionError::new(ErrorKind::Exception, err.to_string())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Success
// ---------------------------------------------------------------------------

/// A completed operation's payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Success {
    pub data: Value,
    pub message: Option<String>,
    pub count: Option<usize>,
}

impl Success {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            message: None,
            count: None,
        }
    }

    /// Serialize a typed payload. A value that cannot be represented as JSON
    /// fails with `EXCEPTION` instead of reporting success without data.
    pub fn record<T: Serialize + ?Sized>(data: &T) -> Result<Self, ActionError> {
        Ok(Self::new(serde_json::to_value(data)?))
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

/// What every handler operation returns.
pub type ActionResult = Result<Success, ActionError>;

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Tagged union of the two envelope shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Success(Success),
    Failure(ActionError),
}

impl Envelope {
    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success(_))
    }

    /// The failure code, if any.
    pub fn code(&self) -> Option<ErrorKind> {
        match self {
            Envelope::Success(_) => None,
            Envelope::Failure(err) => Some(err.kind),
        }
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            Envelope::Success(s) => Some(&s.data),
            Envelope::Failure(_) => None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Envelope::Success(_) => StatusCode::OK,
            Envelope::Failure(err) => err.kind.status_code(),
        }
    }
}

impl From<ActionResult> for Envelope {
    fn from(result: ActionResult) -> Self {
        match result {
            Ok(success) => Envelope::Success(success),
            Err(err) => Envelope::Failure(err),
        }
    }
}

#[derive(Serialize)]
struct SuccessBody<'a> {
    success: bool,
    data: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<usize>,
}

#[derive(Serialize)]
struct FailureBody<'a> {
    success: bool,
    error: &'a str,
    code: ErrorKind,
    #[serde(flatten)]
    diagnostics: &'a Diagnostics,
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Envelope::Success(s) => SuccessBody {
                success: true,
                data: &s.data,
                message: s.message.as_deref(),
                count: s.count,
            }
            .serialize(serializer),
            Envelope::Failure(err) => FailureBody {
                success: false,
                error: &err.message,
                code: err.kind,
                diagnostics: &err.diagnostics,
            }
            .serialize(serializer),
        }
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_omits_absent_message_and_count() {
        let env = Envelope::from(Ok(Success::new(json!({"id": 1}))));
        assert_eq!(
            serde_json::to_value(&env).unwrap(),
            json!({"success": true, "data": {"id": 1}})
        );

        let env = Envelope::from(Ok(Success::new(json!([])).with_count(0).with_message("ok")));
        assert_eq!(
            serde_json::to_value(&env).unwrap(),
            json!({"success": true, "data": [], "message": "ok", "count": 0})
        );
    }

    #[test]
    fn unserializable_record_is_an_exception() {
        let mut keyed = BTreeMap::new();
        keyed.insert((1u8, 2u8), "pair");
        let err = Success::record(&keyed).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Exception);

        let ok = Success::record(&vec![1, 2]).unwrap();
        assert_eq!(ok.data, json!([1, 2]));
    }

    #[test]
    fn missing_params_lists_names_in_camel_case() {
        let env = Envelope::Failure(ActionError::missing_params(vec!["id".into()]));
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "MISSING_PARAMS");
        assert_eq!(json["missingParams"], json!(["id"]));
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn dependency_flags_are_flattened() {
        let err = ActionError::has_dependencies("Provider", 7, &[("hasOrders", true)]);
        let json = serde_json::to_value(Envelope::Failure(err)).unwrap();
        assert_eq!(json["hasDependencies"], true);
        assert_eq!(json["hasOrders"], true);
        assert_eq!(
            json["error"],
            "Provider with id 7 has dependent records (orders). Use force to delete anyway"
        );
    }

    #[test]
    fn status_codes_follow_kind() {
        assert_eq!(ErrorKind::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorKind::HasDependencies.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorKind::HandlerNotFound.status_code(), StatusCode::NOT_IMPLEMENTED);
        assert_eq!(ErrorKind::Exception.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(ErrorKind::InvalidPriority.is_rejection());
        assert!(!ErrorKind::DatabaseError.is_rejection());
    }

    #[test]
    fn store_errors_map_to_database_or_exception() {
        let err: ActionError = StoreError::Unavailable("down".into()).into();
        assert_eq!(err.kind, ErrorKind::DatabaseError);
        assert!(err.message.contains("down"));

        let err: ActionError = StoreError::Decode {
            table: "clientes",
            message: "bad".into(),
        }
        .into();
        assert_eq!(err.kind, ErrorKind::Exception);
    }

    #[test]
    fn core_validation_keeps_every_message() {
        let err: ActionError =
            CoreError::Validation(vec!["nombre is required".into(), "rut is required".into()])
                .into();
        assert_eq!(err.kind, ErrorKind::ValidationError);
        assert_eq!(err.diagnostics.errors.len(), 2);
    }

    #[test]
    fn kind_serializes_screaming_snake_case() {
        assert_eq!(
            serde_json::to_value(ErrorKind::UnknownIntention).unwrap(),
            json!("UNKNOWN_INTENTION")
        );
        for kind in [ErrorKind::HasDependencies, ErrorKind::ExecutionError] {
            assert_eq!(serde_json::to_value(kind).unwrap(), json!(kind.as_str()));
        }
    }
}
