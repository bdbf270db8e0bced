//! HTTP error mapping.
//!
//! Every failure leaves the server as `{"detail": "<message>"}` with a
//! status derived from the failure kind, and is logged once as an
//! `http_request` event.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{error, warn};
use opsdesk_core::{RecordKind, StoreError, ValidationError};
use serde_json::json;

/// Failure of a single API request.
#[derive(Debug)]
pub enum ApiError {
    /// Unknown record, including ids that are not valid UUIDs.
    NotFound(RecordKind),
    /// Request input failed boundary validation.
    Validation(ValidationError),
    /// Body or query string could not be decoded.
    Malformed(String),
    Store(StoreError),
    /// The blocking task running a store call panicked or was cancelled.
    TaskFailed(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) | Self::Malformed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::Transport(_)) | Self::Store(StoreError::Rejected { .. }) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Store(StoreError::Repo(_)) | Self::TaskFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn detail(&self) -> String {
        match self {
            Self::NotFound(kind) | Self::Store(StoreError::NotFound { kind, .. }) => {
                not_found_detail(*kind).to_string()
            }
            Self::Validation(err) => err.to_string(),
            Self::Malformed(message) => message.clone(),
            // Storage internals stay in the log.
            Self::Store(_) | Self::TaskFailed(_) => "internal storage error".to_string(),
        }
    }
}

fn not_found_detail(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Incident => "Incident not found",
        RecordKind::Runbook => "Runbook not found",
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::Malformed(value.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        Self::Malformed(value.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            let cause = match &self {
                Self::Store(err) => err.to_string(),
                Self::TaskFailed(message) => message.clone(),
                other => other.detail(),
            };
            error!(
                "event=http_request module=api status=error code={} error={}",
                status.as_u16(),
                cause
            );
        } else {
            warn!(
                "event=http_request module=api status=rejected code={} detail={}",
                status.as_u16(),
                self.detail()
            );
        }

        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}
