use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use facematch_common::matcher::MatchError;
use facematch_common::store::StoreError;
use serde_json::json;
use thiserror::Error;

use crate::handlers::attendance::AttendanceResponse;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Missing fields")]
    MissingFields,

    #[error("Missing embedding")]
    MissingEmbedding,

    #[error(transparent)]
    InvalidBody(#[from] JsonRejection),

    #[error(transparent)]
    DimensionMismatch(#[from] MatchError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingFields | ApiError::MissingEmbedding => StatusCode::BAD_REQUEST,
            ApiError::InvalidBody(e) => e.status(),
            ApiError::DimensionMismatch(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short, fixed message sent to the client.
    pub fn message(&self) -> &'static str {
        match self {
            ApiError::MissingFields => "Missing fields",
            ApiError::MissingEmbedding => "Missing embedding",
            ApiError::InvalidBody(_) => "Invalid request body",
            ApiError::DimensionMismatch(_) => "Embedding dimension mismatch",
            ApiError::Store(_) => "Server error",
        }
    }

    /// Underlying error text, for the variants that wrap one.
    pub fn detail(&self) -> Option<String> {
        match self {
            ApiError::MissingFields | ApiError::MissingEmbedding => None,
            ApiError::InvalidBody(e) => Some(e.body_text()),
            ApiError::DimensionMismatch(e) => Some(e.to_string()),
            ApiError::Store(e) => Some(e.to_string()),
        }
    }

    fn log(&self) {
        match self {
            ApiError::Store(e) => tracing::error!(error = %e, "store error"),
            e => tracing::error!(error = %e, status = %e.status(), "request error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();

        let body = match self.detail() {
            Some(detail) => json!({ "error": self.message(), "detail": detail }),
            None => json!({ "error": self.message() }),
        };

        (self.status(), Json(body)).into_response()
    }
}

/// An [`ApiError`] rendered in the uniform `/attendance` response shape.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct AttendanceError(#[from] pub ApiError);

impl From<StoreError> for AttendanceError {
    fn from(e: StoreError) -> Self {
        AttendanceError(e.into())
    }
}

impl From<MatchError> for AttendanceError {
    fn from(e: MatchError) -> Self {
        AttendanceError(e.into())
    }
}

impl IntoResponse for AttendanceError {
    fn into_response(self) -> Response {
        let AttendanceError(inner) = self;
        inner.log();

        let body = AttendanceResponse::failure(inner.message(), None, inner.detail());

        (inner.status(), Json(body)).into_response()
    }
}
