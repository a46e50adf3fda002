use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::ConversionError;

/// Error returned by route handlers.
#[derive(Debug)]
pub enum ApiError {
    /// The conversion pipeline failed; the cause is shown to the user.
    Conversion(ConversionError),
    /// Anything else that went wrong while building the response.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self {
            ApiError::Conversion(e) => {
                tracing::error!("conversion failed: {e}");
                format!("Error converting PDF: {e}")
            }
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                format!("Error converting PDF: {msg}")
            }
        };

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response()
    }
}

impl From<ConversionError> for ApiError {
    fn from(e: ConversionError) -> Self {
        ApiError::Conversion(e)
    }
}
