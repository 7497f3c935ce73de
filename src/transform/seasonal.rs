use std::collections::HashMap;
use std::path::Path;

use tracing::info;

use crate::domain::{LoadRecord, Zone};
use crate::error::{AppError, ErrorKind};
use crate::io::{artifact_path, read_table, write_table};
use crate::math::lag_difference;

/// Rewrite the canonical artifact in `dir` with `load_diffed` filled in.
pub fn seasonal_difference(dir: &Path, season_len: usize) -> Result<(), AppError> {
    info!(season_len, "Seasonal differencing");
    validate_season_len(season_len)?;

    let path = artifact_path(dir);
    let mut records = read_table(&path)?;
    apply_seasonal_difference(&mut records, season_len)?;
    write_table(&path, &records)
}

/// Fill `load_diffed` in place.
///
/// The lag counts rows within each zone, in table order: the k-th row of a
/// zone is differenced against that zone's (k - season_len)-th row,
/// regardless of the time elapsed between them.
pub fn apply_seasonal_difference(records: &mut [LoadRecord], season_len: usize) -> Result<(), AppError> {
    validate_season_len(season_len)?;

    let mut by_zone: HashMap<Zone, Vec<usize>> = HashMap::new();
    for (i, r) in records.iter().enumerate() {
        by_zone.entry(r.zone).or_default().push(i);
    }

    for rows in by_zone.values() {
        let loads: Vec<f64> = rows.iter().map(|&i| records[i].load).collect();
        for (&i, diffed) in rows.iter().zip(lag_difference(&loads, season_len)) {
            records[i].load_diffed = diffed;
        }
    }
    Ok(())
}

fn validate_season_len(season_len: usize) -> Result<(), AppError> {
    if season_len == 0 {
        return Err(AppError::new(
            ErrorKind::InvalidParameter,
            "Season length must be a positive number of periods.",
        ));
    }
    Ok(())
}
