use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};

use crate::battle::RotationError;
use crate::registry::RegistryError;
use crate::server::api;
use crate::server::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(api::health))
        .route("/api/ninjas", get(api::list_ninjas))
        .route("/api/ninjas/:name", get(api::get_ninja))
        .route("/api/ninjas/:name/affinities", put(api::put_affinities))
        .route("/api/ninjas/:name/seal", put(api::put_seal))
        .route("/api/summary", get(api::summary))
        .route("/api/rotation", post(api::rotation))
        .fallback(not_found)
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "Route not found")
}

/// JSON error body: `{"status":"error","message":...}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        Self::internal(err.to_string())
    }
}

impl From<RotationError> for ApiError {
    fn from(err: RotationError) -> Self {
        match err {
            RotationError::Input(_) => Self::bad_request(err.to_string()),
            RotationError::TooManyRounds { .. } | RotationError::TooManyEvents { .. } => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "status": "error",
            "message": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}
