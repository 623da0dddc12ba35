//! Request extractors whose rejections surface as `AppError::Validation`.

use axum::extract::{FromRequest, FromRequestParts};

use crate::errors::AppError;

/// JSON body deserialized into a validated request struct. Missing required
/// fields, unknown fields and malformed JSON all reject with a 400.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ValidatedJson<T>(pub T);

/// Query string counterpart of [`ValidatedJson`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ValidatedQuery<T>(pub T);

/// Trims a required text field, rejecting it when blank.
pub fn required_text(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

/// Trims an optional text field; a blank value counts as absent.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
