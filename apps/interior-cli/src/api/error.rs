use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use std::time::Duration;

use interior_core::Error;

#[derive(Debug)]
pub enum ApiError {
    Core(Error),
    Timeout(Duration),
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError::Core(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(Error::InvalidQuery(_) | Error::InvalidLimit(_) | Error::InvalidFilter(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Core(Error::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Core(Error::EmbeddingFailure(_) | Error::IndexUnavailable(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::Core(e) => e.kind(),
            ApiError::Timeout(_) => "Timeout",
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Core(e) => e.to_string(),
            ApiError::Timeout(d) => format!("request did not complete within {}s", d.as_secs()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.message(), kind = self.kind(), "request failed");
        } else {
            tracing::debug!(error = %self.message(), kind = self.kind(), "request rejected");
        }
        let body = serde_json::json!({
            "success": false,
            "error": self.kind(),
            "message": self.message(),
        });
        (status, Json(body)).into_response()
    }
}
