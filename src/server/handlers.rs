use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use tracing::info;

use crate::forecast::{ForecastRequest, render_forecast};

use super::error::{Result, ServerError};
use super::state::AppState;

/// Health check: 200 once the bundle is (or can be) loaded, 404 otherwise.
pub async fn ping(State(state): State<Arc<AppState>>) -> Response {
    let status = if state.model().await.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };
    (status, [(header::CONTENT_TYPE, "application/json")], "\n").into_response()
}

/// Point forecast for `{"date", "time", "area"}`.
pub async fn invocations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    info!(content_type, bytes = body.len(), "Invoked with request");

    let value: Value = serde_json::from_slice(&body).map_err(|_| ServerError::UnsupportedMedia)?;
    if value.is_null() {
        return Err(ServerError::UnsupportedMedia);
    }
    let req: ForecastRequest = serde_json::from_value(value)
        .map_err(|e| ServerError::BadRequest(format!("Invalid request body: {e}")))?;
    info!(date = %req.date, time = %req.time, area = %req.area, "Decoded input");

    let model = state
        .model()
        .await
        .map_err(|e| ServerError::Unavailable(e.message().to_string()))?;
    // Forecast cost grows with the horizon; run it on the blocking pool.
    let text = tokio::task::spawn_blocking(move || render_forecast(&model, &req))
        .await
        .map_err(|e| ServerError::Unavailable(format!("Forecast task failed: {e}")))?
        .map_err(|e| ServerError::BadRequest(e.message().to_string()))?;
    info!(prediction = %text, "Prediction");

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, "text/plain")], text).into_response())
}
