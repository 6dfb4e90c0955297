use crate::error::AuditError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Axum error response for audit failures.
#[derive(Debug)]
pub struct ApiError(pub AuditError);

impl From<AuditError> for ApiError {
    fn from(err: AuditError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AuditError::MissingDomain
            | AuditError::MalformedRequest(_)
            | AuditError::InvalidTarget { .. } => StatusCode::BAD_REQUEST,
            AuditError::EngineUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AuditError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            AuditError::EngineFailed { .. }
            | AuditError::MalformedOutput { .. }
            | AuditError::Fetch { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = json!({
            "error": self.0.external_message()
        });
        (self.status(), Json(payload)).into_response()
    }
}
