//! Forecast query shared by the one-shot CLI and the HTTP handler.
//!
//! Both surfaces go through [`render_forecast`], so the same
//! `(date, time, area)` produces byte-identical text.

pub mod remote;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Zone;
use crate::error::{AppError, ErrorKind};
use crate::models::MultiSeriesModel;
use crate::report::format_forecast;

pub use remote::*;

/// Accepted date layouts, tried in order. chrono's `%m`/`%d` take one or two
/// digits, so `2021-02-1` matches the first entry.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%B %d, %Y"];

/// Body of a forecast request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForecastRequest {
    pub date: String,
    pub time: String,
    pub area: String,
}

impl ForecastRequest {
    pub fn new(date: impl Into<String>, time: impl Into<String>, area: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            time: time.into(),
            area: area.into(),
        }
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    let s = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .ok_or_else(|| AppError::new(ErrorKind::MalformedInput, format!("Invalid date '{raw}'.")))
}

/// `HH:MM` in 24h form; the seconds component is always `:00`.
pub fn parse_time(raw: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(&format!("{}:00", raw.trim()), "%H:%M:%S").map_err(|e| {
        AppError::new(ErrorKind::MalformedInput, format!("Invalid time '{raw}' (expected HH:MM): {e}"))
    })
}

/// Compose a UTC instant from a date and a time of day.
pub fn build_timestamp(date: &str, time: &str) -> Result<DateTime<Utc>, AppError> {
    let date = parse_date(date)?;
    let time = parse_time(time)?;
    Ok(NaiveDateTime::new(date, time).and_utc())
}

/// Raw forecast value in megawatts.
pub fn forecast(model: &MultiSeriesModel, req: &ForecastRequest) -> Result<f64, AppError> {
    let zone: Zone = req.area.parse()?;
    model.predict(&req.date, &req.time, zone)
}

/// Forecast rendered as `"<value> MW"` with two decimals.
pub fn render_forecast(model: &MultiSeriesModel, req: &ForecastRequest) -> Result<String, AppError> {
    forecast(model, req).map(format_forecast)
}
