use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rw_core::Error;
use serde_json::json;

/// Store errors rendered as `{"error": {"code", "message"}}` with a matching status.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            Error::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            Error::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!("❌ {}", self.0);
        }
        let body = json!({
            "error": {
                "code": code,
                "message": self.0.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}
