//! Canonical load table artifact (`training_data.csv`).
//!
//! Columns: `datetime,load,zone,load_diffed`. `datetime` is RFC 3339 UTC and
//! `load_diffed` is empty where undefined.

use std::path::{Path, PathBuf};

use crate::domain::LoadRecord;
use crate::error::{AppError, ErrorKind};

pub const ARTIFACT_NAME: &str = "training_data.csv";

pub fn artifact_path(dir: &Path) -> PathBuf {
    dir.join(ARTIFACT_NAME)
}

/// Overwrite `path` with `records`.
pub fn write_table(path: &Path, records: &[LoadRecord]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| {
        AppError::new(
            ErrorKind::Io,
            format!("Failed to create table '{}': {e}", path.display()),
        )
    })?;
    for r in records {
        writer
            .serialize(r)
            .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to write table row: {e}")))?;
    }
    writer.flush().map_err(|e| {
        AppError::new(
            ErrorKind::Io,
            format!("Failed to flush table '{}': {e}", path.display()),
        )
    })?;
    Ok(())
}

pub fn read_table(path: &Path) -> Result<Vec<LoadRecord>, AppError> {
    if !path.exists() {
        return Err(AppError::new(
            ErrorKind::NotFound,
            format!("Training table '{}' does not exist; run the data loader first.", path.display()),
        ));
    }
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        AppError::new(
            ErrorKind::Io,
            format!("Failed to open table '{}': {e}", path.display()),
        )
    })?;

    let mut out = Vec::new();
    for (idx, row) in reader.deserialize::<LoadRecord>().enumerate() {
        let record = row.map_err(|e| {
            AppError::new(
                ErrorKind::MalformedInput,
                format!("Invalid row {} in '{}': {e}", idx + 2, path.display()),
            )
        })?;
        out.push(record);
    }
    Ok(out)
}
