//! Client for a deployed `/invocations` endpoint.

use reqwest::blocking::Client;
use tracing::{info, warn};

use crate::error::{AppError, ErrorKind};
use crate::forecast::ForecastRequest;

/// POST `req` as JSON to `url` and return the raw response body.
///
/// Non-success statuses still return the body (it carries the server's error
/// message); only transport failures are errors.
pub fn post_forecast(url: &str, req: &ForecastRequest) -> Result<String, AppError> {
    let client = Client::new();
    let resp = client
        .post(url)
        .json(req)
        .send()
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Request to {url} failed: {e}")))?;

    let status = resp.status();
    let body = resp
        .text()
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to read response from {url}: {e}")))?;

    if status.is_success() {
        info!(%url, %status, "Remote forecast received");
    } else {
        warn!(%url, %status, "Remote endpoint returned an error status");
    }
    Ok(body)
}
