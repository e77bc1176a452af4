use serde_json::Value;
use thiserror::Error;

/// A candidate or patch that cannot be narrowed into a record shape.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Field {field} is empty after normalization")]
    EmptyAfterNormalize { field: &'static str },

    #[error("Patch does not apply to a {0} record")]
    PatchKindMismatch(&'static str),

    #[error("Malformed payload: {0}")]
    Malformed(String),
}

/// Require a non-blank string member on an untyped form payload.
pub(crate) fn require_text(payload: &Value, field: &'static str) -> Result<(), ValidationError> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|_| ())
        .ok_or(ValidationError::MissingField(field))
}

pub(crate) fn narrow<T: serde::de::DeserializeOwned>(payload: &Value) -> Result<T, ValidationError> {
    serde_json::from_value(payload.clone()).map_err(|e| ValidationError::Malformed(e.to_string()))
}
