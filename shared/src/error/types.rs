//! `AppError` and the JSON error body

use super::codes::ErrorCode;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Error returned by every handler and business rule
///
/// `details` carries machine-readable context for the storefront, e.g. the
/// offending `field`, an `additional_category_id` or the `min_order_value`.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Error with the code's default message
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Error pointing at one request field
    pub fn field(code: ErrorCode, field: &str) -> Self {
        Self::new(code).with_detail("field", field)
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Generic 404 naming the missing resource
    pub fn not_found(resource: impl Into<String>) -> Self {
        let r = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{r} not found")).with_detail("resource", r)
    }

    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::TokenInvalid, msg)
    }
}

/// Body of every error response: `{"code": 4004, "message": "...", "details": {...}}`
///
/// Successful responses are the plain resource JSON, without an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl From<&AppError> for ErrorBody {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code.code(),
            message: err.message.clone(),
            details: err.details.clone(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        if self.code.category().is_server_fault() {
            tracing::error!(code = %self.code, message = %self.message, "System error occurred");
        }
        (self.http_status(), axum::Json(ErrorBody::from(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn test_new_uses_default_message() {
        let err = AppError::new(ErrorCode::StoreClosed);
        assert_eq!(err.message, "Store is closed");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_details_accumulate() {
        let err = AppError::new(ErrorCode::AdditionalSelectionAboveMax)
            .with_detail("additional_category_id", 42)
            .with_detail("max", 3);
        let details = err.details.unwrap();
        assert_eq!(details["additional_category_id"], 42);
        assert_eq!(details["max"], 3);
    }

    #[test]
    fn test_field_error() {
        let err = AppError::field(ErrorCode::RequiredField, "customer_name");
        assert_eq!(err.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.details.unwrap()["field"], "customer_name");
    }

    #[test]
    fn test_not_found_names_resource() {
        let err = AppError::not_found("Notification");
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.to_string(), "Notification not found");
    }

    #[test]
    fn test_error_body_shape() {
        let err = AppError::with_message(ErrorCode::MinimumOrderNotMet, "Mínimo R$ 20,00")
            .with_detail("min_order_value", 20.0);
        let json = serde_json::to_value(ErrorBody::from(&err)).unwrap();
        assert_eq!(json["code"], 4004);
        assert_eq!(json["message"], "Mínimo R$ 20,00");
        assert_eq!(json["details"]["min_order_value"], 20.0);

        let bare = serde_json::to_value(ErrorBody::from(&AppError::new(ErrorCode::CartEmpty))).unwrap();
        assert!(bare.get("details").is_none());
    }

    #[test]
    fn test_into_response_status() {
        let response = AppError::new(ErrorCode::PaymentGatewayError).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
