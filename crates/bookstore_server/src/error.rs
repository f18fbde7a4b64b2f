//! HTTP error mapping.
//!
//! Every failure renders as `{"error": "<message>"}`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bookstore_core::BookServiceError;
use log::{error, warn};
use serde_json::json;
use std::error::Error;
use std::fmt::{Display, Formatter};
use tokio::task::JoinError;

const INTERNAL_MESSAGE: &str = "an internal server error occurred";

#[derive(Debug)]
pub enum ApiError {
    Service(BookServiceError),
    /// Body was not valid JSON for the endpoint.
    InvalidBody(String),
    /// The blocking worker panicked or was cancelled.
    Worker(JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Service(BookServiceError::Validation(_)) | Self::InvalidBody(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Service(BookServiceError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Service(BookServiceError::Storage(_)) | Self::Worker(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Service(err) => write!(f, "{err}"),
            Self::InvalidBody(message) => write!(f, "invalid request body: {message}"),
            Self::Worker(err) => write!(f, "request worker failed: {err}"),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Service(err) => Some(err),
            Self::InvalidBody(_) => None,
            Self::Worker(err) => Some(err),
        }
    }
}

impl From<BookServiceError> for ApiError {
    fn from(value: BookServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::InvalidBody(value.body_text())
    }
}

impl From<JoinError> for ApiError {
    fn from(value: JoinError) -> Self {
        Self::Worker(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(
                "event=http_request_error module=http status=error code={} error={}",
                status.as_u16(),
                self
            );
            // Storage details stay in the log for release builds.
            if cfg!(debug_assertions) {
                self.to_string()
            } else {
                INTERNAL_MESSAGE.to_string()
            }
        } else {
            warn!(
                "event=http_request_error module=http status=rejected code={} error={}",
                status.as_u16(),
                self
            );
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookstore_core::{BookValidationError, RepoError};

    #[test]
    fn service_errors_map_to_client_and_server_statuses() {
        let validation = ApiError::from(BookServiceError::Validation(
            BookValidationError::single("price", "price must be greater than 0"),
        ));
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);

        let not_found = ApiError::from(BookServiceError::NotFound(9));
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let storage = ApiError::from(BookServiceError::Storage(RepoError::InvalidData(
            "corrupt row".to_string(),
        )));
        assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn invalid_body_is_bad_request() {
        let response = ApiError::InvalidBody("expected value".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
