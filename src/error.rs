//! API error type shared by the write-path handlers.
//!
//! Reader-facing handlers never return these for store failures; they fall
//! back to default content instead (see [`crate::content::fetch_with_fallback`]).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blob::UploadError;
use crate::content::ContentError;
use crate::mailer::RelayError;
use crate::store::StoreError;

/// JSON body for every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Not found")]
    NotFound,

    #[error("Too many requests, please try again later.")]
    RateLimited,

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Upstream(String),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Upload(UploadError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) | ApiError::Content(_) | ApiError::Upload(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound | ApiError::Store(StoreError::NotFound { .. }) => {
                StatusCode::NOT_FOUND
            }
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Upstream(_) | ApiError::Relay(_) => StatusCode::BAD_GATEWAY,
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            // Store and relay internals stay in the logs.
            ApiError::Store(e) if status.is_server_error() => {
                tracing::error!(error = %e, "document store write failed");
                ErrorResponse::new("Document store error")
            }
            ApiError::Relay(e) => {
                tracing::error!(error = %e, "contact relay failed");
                ErrorResponse::new("Failed to send message. Please try again later.")
            }
            ApiError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                ErrorResponse::new("Internal server error")
            }
            other => ErrorResponse::new(other.to_string()),
        };

        (status, Json(body)).into_response()
    }
}
