//! JSON envelope shared by every endpoint and the error-to-status mapping.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::{core::store::StoreError, runtime::handle::RuntimeError};

/// Successful response body: `{success: true, message?, data, warnings?}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Always true.
    pub success: bool,
    /// Human-readable outcome.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Payload; serialized even when it is `null`.
    pub data: T,
    /// Side effects that failed after the main change committed.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl<T> ApiResponse<T> {
    /// Wraps `data` with no message.
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
            warnings: Vec::new(),
        }
    }

    /// Sets the message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Appends warnings.
    pub fn with_warnings(mut self, warnings: impl IntoIterator<Item = String>) -> Self {
        self.warnings.extend(warnings);
        self
    }
}

#[derive(Debug, Serialize)]
struct ApiFailure {
    success: bool,
    message: String,
}

/// Every way a handler can fail. Rendered as `{success: false, message}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Store refusal or a stopped store.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    /// Body that could not be read as JSON of the expected shape.
    #[error("{0}")]
    BadRequest(String),
    /// `GET /current` before any itinerary was set.
    #[error("No itinerary data available yet. Please upload and process an itinerary document first.")]
    NoCurrentItinerary,
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Runtime(RuntimeError::Store(err)) if err.is_validation() => StatusCode::BAD_REQUEST,
            Self::Runtime(RuntimeError::Store(StoreError::BackupNotFound)) => StatusCode::NOT_FOUND,
            Self::Runtime(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NoCurrentItinerary => StatusCode::NOT_FOUND,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        Self::Runtime(RuntimeError::Store(value))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::BadRequest(value.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(err = %self, "request failed");
        }
        let body = ApiFailure {
            success: false,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
