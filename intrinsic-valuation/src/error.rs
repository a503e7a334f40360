//! HTTP error responses for the valuation service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::data::ProviderError;

/// Error body payload.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Route error wrapping the service-wide error type.
#[derive(Debug)]
pub struct ApiError(pub intrinsic_common::Error);

impl ApiError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self(intrinsic_common::Error::InvalidInput(message.into()))
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<intrinsic_common::Error> for ApiError {
    fn from(err: intrinsic_common::Error) -> Self {
        Self(err)
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self.0, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self.0, "Request rejected");
        }

        let body = serde_json::json!({
            "success": false,
            "error": ErrorBody {
                code: self.0.code().to_string(),
                message: self.0.to_string(),
            }
        });

        (status, axum::Json(body)).into_response()
    }
}
