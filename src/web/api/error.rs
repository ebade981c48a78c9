use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::web::auth::PermissionError;

pub enum ApiError {
    Permission(PermissionError),
    /// No report exists yet (first run still in flight, or every run so far
    /// hit the no-data condition).
    NotReady,
    Conflict(&'static str),
}

impl From<PermissionError> for ApiError {
    fn from(e: PermissionError) -> Self {
        ApiError::Permission(e)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: &str) -> Self {
        Self {
            error: error.to_string(),
            message: None,
        }
    }

    pub fn with_message(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: Some(message.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Permission(e) => e.into_response(),
            ApiError::NotReady => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse::with_message(
                    "report_not_ready",
                    "no pipeline report is available yet",
                )),
            )
                .into_response(),
            ApiError::Conflict(reason) => {
                (StatusCode::CONFLICT, Json(ErrorResponse::new(reason))).into_response()
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
