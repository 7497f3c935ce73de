use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::error::{AppError, ErrorKind};
use crate::io::load_bundle;
use crate::models::MultiSeriesModel;

/// Process-wide serving state: the bundle is loaded at most once and then
/// shared read-only by every handler.
pub struct AppState {
    pub model_file: PathBuf,
    bundle: OnceCell<Arc<MultiSeriesModel>>,
}

impl AppState {
    pub fn new(model_file: PathBuf) -> Self {
        Self {
            model_file,
            bundle: OnceCell::new(),
        }
    }

    /// State with an already loaded bundle.
    pub fn with_model(model_file: PathBuf, model: MultiSeriesModel) -> Self {
        Self {
            model_file,
            bundle: OnceCell::new_with(Some(Arc::new(model))),
        }
    }

    /// The bundle, loading it on first use.
    ///
    /// Racing first callers wait on a single load. A failed load leaves the
    /// cell empty, so the next call retries.
    pub async fn model(&self) -> Result<Arc<MultiSeriesModel>, AppError> {
        self.bundle
            .get_or_try_init(|| async {
                let path = self.model_file.clone();
                let loaded = tokio::task::spawn_blocking(move || load_bundle(&path))
                    .await
                    .map_err(|e| AppError::new(ErrorKind::Io, format!("Model load task failed: {e}")))
                    .and_then(|r| r);
                match loaded {
                    Ok(model) => {
                        info!(
                            path = %self.model_file.display(),
                            zones = ?model.fitted_zones(),
                            "Model bundle loaded"
                        );
                        Ok(Arc::new(model))
                    }
                    Err(err) => {
                        error!(path = %self.model_file.display(), error = %err, "Model bundle load failed");
                        Err(err)
                    }
                }
            })
            .await
            .cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.bundle.initialized()
    }
}
