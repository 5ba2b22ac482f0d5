//! Maps [`CoreError`] (and a couple of HTTP-only cases) onto status codes and JSON bodies.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use scanner_core::CoreError;
use serde::Serialize;

/// HTTP-facing error. Wraps [`CoreError`] and adds the two cases that only make sense at the
/// transport boundary (missing/invalid Basic auth header).
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Missing or malformed Authorization header")]
    Unauthenticated,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Unauthenticated => (StatusCode::UNAUTHORIZED, self.to_string()),
            Self::Core(err) => (status_for(err), err.user_message()),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Maps each `CoreError` variant to its HTTP status and JSON body.
fn status_for(err: &CoreError) -> StatusCode {
    match err {
        CoreError::InvalidUrl { .. } => StatusCode::BAD_REQUEST,
        CoreError::NotReady { .. } => StatusCode::BAD_REQUEST,
        CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        CoreError::TooManyJobs { .. } => StatusCode::TOO_MANY_REQUESTS,
        CoreError::Acquisition { .. }
        | CoreError::Scanner { .. }
        | CoreError::Timeout { .. }
        | CoreError::Io { .. }
        | CoreError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
