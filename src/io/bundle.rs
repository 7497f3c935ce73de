//! Read/write the model bundle.
//!
//! The bundle is a pretty-printed JSON rendering of `MultiSeriesModel`: order,
//! sampling period, and per zone either the fitted ARIMA state (with its
//! training series, so forecasts can be reproduced exactly) or the failure
//! reason.

use std::fs::{File, create_dir_all};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::domain::MODEL_FILE_NAME;
use crate::error::{AppError, ErrorKind};
use crate::models::MultiSeriesModel;

/// Write `<dir>/model.json`, creating `dir` if needed.
pub fn save_bundle(dir: &Path, model: &MultiSeriesModel) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| {
        AppError::new(
            ErrorKind::Io,
            format!("Failed to create model dir '{}': {e}", dir.display()),
        )
    })?;
    let path = dir.join(MODEL_FILE_NAME);
    let file = File::create(&path).map_err(|e| {
        AppError::new(
            ErrorKind::Io,
            format!("Failed to create model bundle '{}': {e}", path.display()),
        )
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, model)
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to write model bundle: {e}")))?;
    writer
        .flush()
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to write model bundle: {e}")))?;
    Ok(path)
}

/// Read a bundle from a file path.
pub fn load_bundle(path: &Path) -> Result<MultiSeriesModel, AppError> {
    let file = File::open(path).map_err(|e| {
        let kind = if e.kind() == std::io::ErrorKind::NotFound {
            ErrorKind::NotFound
        } else {
            ErrorKind::Io
        };
        AppError::new(kind, format!("Failed to open model bundle '{}': {e}", path.display()))
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        AppError::new(
            ErrorKind::MalformedInput,
            format!("Invalid model bundle '{}': {e}", path.display()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ArimaOrder;

    #[test]
    fn save_then_load_empty_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let model = MultiSeriesModel::new(ArimaOrder::default(), 600);
        let path = save_bundle(&dir.path().join("model"), &model).unwrap();
        assert!(path.ends_with("model/model.json"));
        assert_eq!(load_bundle(&path).unwrap(), model);
    }

    #[test]
    fn missing_and_corrupt_bundles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MODEL_FILE_NAME);
        assert_eq!(load_bundle(&path).unwrap_err().kind(), ErrorKind::NotFound);

        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_bundle(&path).unwrap_err().kind(), ErrorKind::MalformedInput);
    }
}
