//! HTTP serving surface.
//!
//! - `GET /ping`: health check, triggers the lazy bundle load
//! - `POST /invocations`: point forecast, plain-text `"<value> MW"`

mod error;
mod handlers;
mod state;

pub use error::{ServerError, UNSUPPORTED_MEDIA_MESSAGE};
pub use state::AppState;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tracing::{info, warn};

use crate::domain::ServeConfig;
use crate::error::{AppError, ErrorKind};

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/invocations", post(handlers::invocations))
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn run_server(config: ServeConfig) -> Result<(), AppError> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse().map_err(|e| {
        AppError::new(
            ErrorKind::InvalidParameter,
            format!("Invalid listen address {}:{}: {e}", config.host, config.port),
        )
    })?;

    let state = Arc::new(AppState::new(config.model_file.clone()));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to bind {addr}: {e}")))?;
    info!(
        address = %addr,
        model_file = %config.model_file.display(),
        pid = std::process::id(),
        "Server listening (model loads on first request)"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Server error: {e}")))?;

    info!("Server shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, stopping server gracefully"),
        Err(e) => {
            warn!(error = %e, "Failed to install Ctrl-C handler; running until killed");
            std::future::pending::<()>().await;
        }
    }
}
