//! Synthetic PJM instantaneous-load exports for local pipeline runs.
//!
//! Each zone follows a daily cycle around its base load plus AR(1) noise, on
//! the feed's 10-minute cadence. Files mimic PJM's per-day CSV layout so they
//! go through the regular loader unchanged.

use std::collections::hash_map::DefaultHasher;
use std::fs::create_dir_all;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use tracing::info;

use crate::domain::{DEFAULT_FREQ_SECS, LoadRecord, Zone};
use crate::error::{AppError, ErrorKind};
use crate::io::{LOAD_COLUMN, TIMESTAMP_COLUMN};

/// Relative amplitude of the daily cycle.
const DAILY_AMPLITUDE: f64 = 0.15;
/// Persistence of the noise process.
const NOISE_PHI: f64 = 0.8;
/// Innovation std dev as a fraction of base load.
const NOISE_REL_SIGMA: f64 = 0.004;
/// Eastern standard time offset used for the informational EPT column.
const EPT_OFFSET_HOURS: i64 = -5;
const PJM_TIMESTAMP_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

#[derive(Debug, Clone, PartialEq)]
pub struct SynthConfig {
    pub start: NaiveDate,
    pub days: usize,
    pub seed: u64,
    /// Zones and their base load in MW.
    pub zones: Vec<(Zone, f64)>,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2021, 2, 1).unwrap_or_default(),
            days: 3,
            seed: 42,
            zones: vec![(Zone::Pe, 4200.0), (Zone::Pep, 3100.0)],
        }
    }
}

/// Generate records ordered by timestamp, zones interleaved in config order.
pub fn generate_records(config: &SynthConfig) -> Result<Vec<LoadRecord>, AppError> {
    if config.days == 0 {
        return Err(AppError::new(ErrorKind::InvalidParameter, "Days must be > 0."));
    }
    if config.zones.is_empty() {
        return Err(AppError::new(ErrorKind::InvalidParameter, "At least one zone is required."));
    }

    let steps_per_day = (86_400 / DEFAULT_FREQ_SECS) as usize;
    let n = config.days * steps_per_day;
    let start: DateTime<Utc> = config.start.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();

    let mut per_zone = Vec::with_capacity(config.zones.len());
    for &(zone, base) in &config.zones {
        if !(base.is_finite() && base > 0.0) {
            return Err(AppError::new(
                ErrorKind::InvalidParameter,
                format!("Base load for {zone} must be positive."),
            ));
        }
        per_zone.push(zone_path(zone, base, n, steps_per_day, config.seed)?);
    }

    let mut out = Vec::with_capacity(n * config.zones.len());
    for i in 0..n {
        let datetime = start + Duration::seconds(DEFAULT_FREQ_SECS * i as i64);
        for ((zone, _), loads) in config.zones.iter().zip(&per_zone) {
            out.push(LoadRecord {
                datetime,
                load: loads[i],
                zone: *zone,
                load_diffed: None,
            });
        }
    }
    Ok(out)
}

/// Write one PJM-style CSV per day into `dir` and return the file paths.
pub fn write_sample_csvs(dir: &Path, config: &SynthConfig) -> Result<Vec<PathBuf>, AppError> {
    let records = generate_records(config)?;
    create_dir_all(dir).map_err(|e| {
        AppError::new(
            ErrorKind::Io,
            format!("Failed to create sample dir '{}': {e}", dir.display()),
        )
    })?;

    let mut paths = Vec::new();
    for day_rows in records.chunk_by(|a, b| a.datetime.date_naive() == b.datetime.date_naive()) {
        let day = day_rows[0].datetime.date_naive();
        let path = dir.join(format!("pjm_inst_load_{}.csv", day.format("%Y-%m-%d")));
        let mut writer = csv::Writer::from_path(&path).map_err(|e| {
            AppError::new(
                ErrorKind::Io,
                format!("Failed to create '{}': {e}", path.display()),
            )
        })?;
        writer
            .write_record([TIMESTAMP_COLUMN, "datetime_beginning_ept", "area", LOAD_COLUMN])
            .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to write sample header: {e}")))?;
        for r in day_rows {
            let ept = r.datetime + Duration::hours(EPT_OFFSET_HOURS);
            writer
                .write_record([
                    r.datetime.format(PJM_TIMESTAMP_FORMAT).to_string(),
                    ept.format(PJM_TIMESTAMP_FORMAT).to_string(),
                    r.zone.code().to_string(),
                    format!("{:.3}", r.load),
                ])
                .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to write sample row: {e}")))?;
        }
        writer
            .flush()
            .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to flush '{}': {e}", path.display())))?;
        paths.push(path);
    }

    info!(files = paths.len(), rows = records.len(), dir = %dir.display(), "Wrote synthetic load data");
    Ok(paths)
}

fn zone_path(zone: Zone, base: f64, n: usize, steps_per_day: usize, seed: u64) -> Result<Vec<f64>, AppError> {
    let mut rng = StdRng::seed_from_u64(zone_seed(zone, seed));
    let normal = Normal::new(0.0, base * NOISE_REL_SIGMA)
        .map_err(|e| AppError::new(ErrorKind::InvalidParameter, format!("Noise distribution error: {e}")))?;

    // Zones peak at slightly different times of day.
    let phase = rng.gen_range(0.0..std::f64::consts::TAU);
    let mut noise = 0.0;
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let angle = std::f64::consts::TAU * (i % steps_per_day) as f64 / steps_per_day as f64;
        noise = NOISE_PHI * noise + normal.sample(&mut rng);
        out.push(base * (1.0 + DAILY_AMPLITUDE * (angle + phase).sin()) + noise);
    }
    Ok(out)
}

fn zone_seed(zone: Zone, seed: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    zone.hash(&mut hasher);
    seed.hash(&mut hasher);
    hasher.finish()
}
