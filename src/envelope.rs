//! The response envelope shared by every endpoint.
//!
//! Successes, warnings and errors all serialise to the same shape:
//!
//! ```json
//! {
//!   "status": "success" | "warning" | "error",
//!   "message": "...",
//!   "resource_id": "...",        // when relevant
//!   "content_id": 1,             // when relevant
//!   "error": "...",              // developer-facing detail on failure
//!   "basic_meta": { ... },       // resource metadata fetches
//!   "detail_meta": { ... },
//!   "response_data": { ... }     // operation-specific payload
//! }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mediavault_core::ServiceError;
use mediavault_id::ResourceId;
use mediavault_types::ResourceMeta;
use utoipa::ToSchema;

#[derive(Debug, serde::Serialize, ToSchema)]
pub struct ApiEnvelope {
    /// `success`, `warning` or `error`.
    pub status: String,
    /// User-facing outcome description.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_id: Option<u32>,
    /// Developer-facing error detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub basic_meta: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub detail_meta: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub response_data: Option<serde_json::Value>,
}

impl ApiEnvelope {
    fn base(status: &str, message: impl Into<String>) -> Self {
        Self {
            status: status.to_owned(),
            message: message.into(),
            resource_id: None,
            content_id: None,
            error: None,
            basic_meta: None,
            detail_meta: None,
            response_data: None,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::base("success", message)
    }

    pub fn warning(message: impl Into<String>, error: impl Into<String>) -> Self {
        let mut envelope = Self::base("warning", message);
        envelope.error = Some(error.into());
        envelope
    }

    pub fn error(message: impl Into<String>, error: impl Into<String>) -> Self {
        let mut envelope = Self::base("error", message);
        envelope.error = Some(error.into());
        envelope
    }

    pub fn with_resource_id(mut self, resource_id: &ResourceId) -> Self {
        self.resource_id = Some(resource_id.to_string());
        self
    }

    pub fn with_content_id(mut self, content_id: u32) -> Self {
        self.content_id = Some(content_id);
        self
    }

    /// Attaches a metadata record as `basic_meta`/`detail_meta`.
    pub fn with_meta(mut self, meta: &ResourceMeta) -> Self {
        self.basic_meta = meta
            .basic_meta
            .as_ref()
            .and_then(|basic| serde_json::to_value(basic).ok());
        self.detail_meta = meta
            .detail_meta
            .as_ref()
            .and_then(|detail| serde_json::to_value(detail).ok());
        self
    }

    /// Attaches an operation-specific payload as `response_data`.
    pub fn with_data(mut self, data: impl serde::Serialize) -> Self {
        self.response_data = serde_json::to_value(data).ok();
        self
    }

    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

/// A failed request: status code plus envelope, logged at construction with
/// the originating operation name.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    envelope: ApiEnvelope,
}

impl ApiFailure {
    /// Maps a service error onto its HTTP status and envelope.
    pub fn from_service(op: &'static str, err: ServiceError) -> Self {
        let message = err.message();
        let detail = err.detail();

        let (status, envelope) = match &err {
            ServiceError::Validation { .. } => {
                (StatusCode::BAD_REQUEST, ApiEnvelope::error(&message, &detail))
            }
            ServiceError::NotFound { .. } => {
                (StatusCode::NOT_FOUND, ApiEnvelope::error(&message, &detail))
            }
            ServiceError::DuplicateContent { .. } => (
                StatusCode::BAD_REQUEST,
                ApiEnvelope::warning(&message, &detail),
            ),
            ServiceError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiEnvelope::error(&message, &detail),
            ),
            ServiceError::Unsupported { .. } => (
                StatusCode::NOT_IMPLEMENTED,
                ApiEnvelope::error(&message, &detail),
            ),
        };

        if matches!(err, ServiceError::DuplicateContent { .. }) {
            tracing::warn!(op, status = %status, "{message} - {detail}");
        } else {
            tracing::error!(op, status = %status, "{message} - {detail}");
        }

        Self { status, envelope }
    }

    pub fn bad_request(
        op: &'static str,
        message: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        let message = message.into();
        let detail = detail.into();
        tracing::error!(op, "{message} - {detail}");
        Self {
            status: StatusCode::BAD_REQUEST,
            envelope: ApiEnvelope::error(message, detail),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::warn!("unauthorized request: {message}");
        Self {
            status: StatusCode::UNAUTHORIZED,
            envelope: ApiEnvelope::error(message, "authentication failed"),
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        self.envelope.into_response_with(self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_omits_empty_fields() {
        let envelope = ApiEnvelope::success("done");
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["status"], "success");
        assert_eq!(json["message"], "done");
        assert!(json.get("error").is_none());
        assert!(json.get("resource_id").is_none());
    }

    #[test]
    fn test_envelope_builders() {
        let id = ResourceId::generate();
        let envelope = ApiEnvelope::success("created")
            .with_resource_id(&id)
            .with_content_id(1)
            .with_data(serde_json::json!({"k": "v"}));
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["resource_id"], id.to_string());
        assert_eq!(json["content_id"], 1);
        assert_eq!(json["response_data"]["k"], "v");
    }

    #[test]
    fn test_duplicate_maps_to_warning_400() {
        let failure = ApiFailure::from_service(
            "test",
            ServiceError::duplicate("Duplicate.", "same hash"),
        );
        assert_eq!(failure.status, StatusCode::BAD_REQUEST);
        assert_eq!(failure.envelope.status, "warning");
        assert_eq!(failure.envelope.error.as_deref(), Some("same hash"));
    }

    #[test]
    fn test_unsupported_maps_to_501() {
        let failure = ApiFailure::from_service(
            "test",
            ServiceError::unsupported("Not here.", "stub"),
        );
        assert_eq!(failure.status, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(failure.envelope.status, "error");
    }
}
