//! HTTP error mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Result type alias for handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors a handler can surface to the client
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal(e: impl std::fmt::Display) -> Self {
        Self::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            Self::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail),
            Self::NotFound(detail) => (StatusCode::NOT_FOUND, detail),
            Self::Internal(detail) => {
                tracing::error!("Internal error: {detail}");
                (StatusCode::INTERNAL_SERVER_ERROR, detail)
            }
        };
        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}

impl From<repoinsight_meta_data::MetaDataError> for ApiError {
    fn from(e: repoinsight_meta_data::MetaDataError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<repoinsight_tasks::TaskQueueError> for ApiError {
    fn from(e: repoinsight_tasks::TaskQueueError) -> Self {
        Self::Internal(e.to_string())
    }
}
