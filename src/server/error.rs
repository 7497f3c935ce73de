//! HTTP error mapping for the serving surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{error, warn};

pub const UNSUPPORTED_MEDIA_MESSAGE: &str = "This predictor only supports application/json data.";

#[derive(Debug)]
pub enum ServerError {
    /// Body could not be parsed as JSON at all.
    UnsupportedMedia,
    /// JSON with the wrong shape, or a rejected forecast.
    BadRequest(String),
    /// The model bundle could not be loaded.
    Unavailable(String),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerError::UnsupportedMedia => f.write_str(UNSUPPORTED_MEDIA_MESSAGE),
            ServerError::BadRequest(msg) | ServerError::Unavailable(msg) => f.write_str(msg),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::UnsupportedMedia => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ServerError::BadRequest(msg) => {
                warn!(detail = %msg, "Rejected invocation");
                StatusCode::BAD_REQUEST
            }
            ServerError::Unavailable(msg) => {
                error!(detail = %msg, "Model unavailable");
                StatusCode::SERVICE_UNAVAILABLE
            }
        };
        (status, [("content-type", "text/plain")], self.to_string()).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
