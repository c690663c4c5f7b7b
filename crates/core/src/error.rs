#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    /// One or more field-level violations, reported together.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Invalid value '{value}' for {field}. Must be one of: {}", .allowed.join(", "))]
    InvalidValue {
        field: &'static str,
        value: String,
        allowed: Vec<&'static str>,
    },

    #[error("Order number sequence exhausted for {0}")]
    SequenceExhausted(String),
}
