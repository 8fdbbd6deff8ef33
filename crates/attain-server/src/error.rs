use attain_core::AttainError;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

pub struct ApiError(pub AttainError);

impl From<AttainError> for ApiError {
    fn from(err: AttainError) -> Self {
        Self(err)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self(AttainError::InvalidInput(format!(
            "malformed upload: {}",
            err.body_text()
        )))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AttainError::InvalidInput(_) | AttainError::Configuration(_) => StatusCode::BAD_REQUEST,
            AttainError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(event = "request_failed", error = %self.0);
        }

        let message = match &self.0 {
            AttainError::InvalidInput(msg) | AttainError::NotFound(msg) => msg.clone(),
            other => other.to_string(),
        };
        let body = serde_json::json!({ "error": message });
        (status, Json(body)).into_response()
    }
}
