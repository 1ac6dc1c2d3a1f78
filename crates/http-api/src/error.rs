//! Mapping from [`MaskerError`] to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use masker_common::error::MaskerError;

/// JSON error body: `{"error": code}` plus `message` for engine failures.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Handler error; converts into a status code and [`ErrorBody`].
#[derive(Debug)]
pub struct ApiError(pub MaskerError);

impl<E> From<E> for ApiError
where
    E: Into<MaskerError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            MaskerError::Validation(_) => StatusCode::BAD_REQUEST,
            MaskerError::SizeLimit { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable error code for the response body.
    pub fn code(&self) -> &'static str {
        match &self.0 {
            MaskerError::Validation(kind) => kind.code(),
            MaskerError::SizeLimit { .. } => "file_too_large",
            MaskerError::Transcode { .. } => "ffmpeg_error",
            _ => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let message = match &self.0 {
            // Engine diagnostics go back to the caller verbatim.
            MaskerError::Transcode { message } => Some(message.clone()),
            MaskerError::Validation(_) | MaskerError::SizeLimit { .. } => None,
            other => {
                tracing::error!(error = %other, "Mask request failed");
                None
            }
        };

        let body = ErrorBody {
            error: code.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
