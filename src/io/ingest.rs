//! Raw PJM CSV ingest and normalization.
//!
//! Turns a directory of per-day PJM instantaneous-load exports into the single
//! canonical table:
//! - every `.csv` in the directory (except the canonical artifact itself)
//! - strict schema: timestamp, zone and load columns must exist in every file,
//!   and all files must share one header layout
//! - every row must parse; one bad value fails the whole load
//! - stable sort by timestamp, duplicates kept
//!
//! The artifact is only written once every file has been read successfully.

use std::collections::HashMap;
use std::fs::read_dir;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use csv::StringRecord;
use tracing::{debug, info};

use crate::domain::{LoadRecord, Zone};
use crate::error::{AppError, ErrorKind};
use crate::io::table::{ARTIFACT_NAME, artifact_path, write_table};

pub const TIMESTAMP_COLUMN: &str = "datetime_beginning_utc";
pub const LOAD_COLUMN: &str = "instantaneous_load";
/// Zone column names, in order of preference.
pub const ZONE_COLUMNS: [&str; 2] = ["area", "zone"];

/// Naive layouts interpreted as UTC (RFC 3339 is tried first).
const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M",
];

/// What a successful load produced.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestSummary {
    pub files: Vec<PathBuf>,
    pub rows: usize,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub artifact: PathBuf,
}

/// Load every source CSV in `source`, normalize, sort and write the
/// canonical artifact into the same directory.
pub fn format_source_data(source: &Path) -> Result<IngestSummary, AppError> {
    info!(source = %source.display(), "Loading raw data");

    let files = list_source_files(source)?;
    if files.is_empty() {
        return Err(AppError::new(
            ErrorKind::NoData,
            format!("No CSV files found in '{}'.", source.display()),
        ));
    }

    let mut records = Vec::new();
    let mut schema: Option<(PathBuf, Vec<String>)> = None;
    for path in &files {
        let (headers, rows) = read_source_file(path)?;
        match &schema {
            None => schema = Some((path.clone(), headers)),
            Some((first, expected)) if *expected != headers => {
                return Err(AppError::new(
                    ErrorKind::MalformedInput,
                    format!(
                        "CSV schemas disagree: '{}' has columns [{}] but '{}' has [{}].",
                        path.display(),
                        headers.join(", "),
                        first.display(),
                        expected.join(", ")
                    ),
                ));
            }
            Some(_) => {}
        }
        debug!(file = %path.display(), rows = rows.len(), "Read source file");
        records.extend(rows);
    }

    if records.is_empty() {
        return Err(AppError::new(
            ErrorKind::NoData,
            format!("Source files in '{}' contain no records.", source.display()),
        ));
    }

    // `sort_by_key` is stable: equal timestamps keep file and row order.
    records.sort_by_key(|r| r.datetime);

    let artifact = artifact_path(source);
    write_table(&artifact, &records)?;

    let start = records[0].datetime;
    let end = records[records.len() - 1].datetime;
    info!(
        rows = records.len(),
        files = files.len(),
        start = %start.to_rfc3339(),
        end = %end.to_rfc3339(),
        "ETL complete"
    );

    Ok(IngestSummary {
        files,
        rows: records.len(),
        start,
        end,
        artifact,
    })
}

/// `.csv` files in `dir` (case-insensitive extension), sorted by file name,
/// excluding the canonical artifact.
pub fn list_source_files(dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    let entries = read_dir(dir).map_err(|e| {
        AppError::new(
            ErrorKind::Io,
            format!("Failed to list source directory '{}': {e}", dir.display()),
        )
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            AppError::new(ErrorKind::Io, format!("Failed to read directory entry: {e}"))
        })?;
        let path = entry.path();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        let is_artifact = path.file_name().and_then(|n| n.to_str()) == Some(ARTIFACT_NAME);
        if path.is_file() && is_csv && !is_artifact {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Parse a UTC timestamp in any of the accepted layouts.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    let s = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }
    Err(format!("Invalid timestamp '{raw}'."))
}

fn read_source_file(path: &Path) -> Result<(Vec<String>, Vec<LoadRecord>), AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| {
            AppError::new(
                ErrorKind::Io,
                format!("Failed to open CSV '{}': {e}", path.display()),
            )
        })?;

    let headers = reader
        .headers()
        .map_err(|e| {
            AppError::new(
                ErrorKind::MalformedInput,
                format!("Failed to read CSV headers of '{}': {e}", path.display()),
            )
        })?
        .clone();
    let names: Vec<String> = headers.iter().map(normalize_header_name).collect();
    let columns = Columns::resolve(&names).map_err(|msg| {
        AppError::new(ErrorKind::MalformedInput, format!("{}: {msg}", path.display()))
    })?;

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let record = result.map_err(|e| {
            AppError::new(
                ErrorKind::MalformedInput,
                format!("{}:{line}: CSV parse error: {e}", path.display()),
            )
        })?;
        let row = parse_row(&record, &columns).map_err(|msg| {
            AppError::new(ErrorKind::MalformedInput, format!("{}:{line}: {msg}", path.display()))
        })?;
        rows.push(row);
    }
    Ok((names, rows))
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    timestamp: usize,
    zone: usize,
    /// Header the zone column was found under (`area` or `zone`).
    zone_name: &'static str,
    load: usize,
}

impl Columns {
    fn resolve(names: &[String]) -> Result<Self, String> {
        let index: HashMap<&str, usize> = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_str(), i))
            .collect();
        let find = |name: &str| {
            index
                .get(name)
                .copied()
                .ok_or_else(|| format!("Missing required column: `{name}`"))
        };
        let (zone_name, zone) = ZONE_COLUMNS
            .iter()
            .find_map(|&c| index.get(c).map(|&i| (c, i)))
            .ok_or_else(|| format!("Missing required column: `{}`", ZONE_COLUMNS.join("` or `")))?;
        Ok(Self {
            timestamp: find(TIMESTAMP_COLUMN)?,
            zone,
            zone_name,
            load: find(LOAD_COLUMN)?,
        })
    }
}

fn parse_row(record: &StringRecord, columns: &Columns) -> Result<LoadRecord, String> {
    let field = |idx: usize, name: &str| {
        record
            .get(idx)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| format!("Missing required value: `{name}`"))
    };

    let datetime = parse_timestamp(field(columns.timestamp, TIMESTAMP_COLUMN)?)?;
    let zone_raw = field(columns.zone, columns.zone_name)?;
    let zone: Zone = zone_raw.parse().map_err(|e: AppError| e.message().to_string())?;
    let load_raw = field(columns.load, LOAD_COLUMN)?;
    let load = load_raw
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("Invalid load '{load_raw}'."))?;

    Ok(LoadRecord {
        datetime,
        load,
        zone,
        load_diffed: None,
    })
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports may prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}
