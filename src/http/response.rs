//! Error responses.
//!
//! Every failure leaves the gateway as `{"error": <message>, "code": <code>}`
//! plus the failing step when there is one.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::pipeline::PipelineError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// No node transport was configured at startup.
    #[error("Elements node is not connected")]
    Unavailable,

    /// The request body or query could not be decoded.
    #[error("Malformed request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: String,
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    step: Option<&'a str>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(e) => StatusCode::from_u16(e.class().status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unavailable => "ElementsRpcUnavailable",
            ApiError::BadRequest(_) => "MalformedRequest",
            ApiError::Pipeline(e) => e.code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let step = match &self {
            ApiError::Pipeline(e) => e.step(),
            _ => None,
        };

        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), code = self.code(), error = %self, "Request failed");
        }

        let body = ErrorBody {
            error: self.to_string(),
            code: self.code(),
            step,
        };
        (status, Json(body)).into_response()
    }
}
