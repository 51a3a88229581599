use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub const TOPIC_ID_REQUIRED: &str = "Topic ID is required";
pub const INVALID_BODY: &str = "Invalid request body";
pub const AGENT_ID_NOT_CONFIGURED: &str = "ElevenLabs agent ID not configured";
pub const TOPIC_NOT_FOUND: &str = "Topic not found";
pub const SIGNED_URL_FAILED: &str = "Failed to get signed URL";

/// Failures of the broker, each rendered as `{"error": message}`.
///
/// Messages are fixed and client-safe; causes are logged where they occur.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("{0}")]
    Configuration(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Upstream(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Configuration(msg) | ApiError::Upstream(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
