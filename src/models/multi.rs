//! One fitted ARIMA per zone, dispatched by zone at prediction time.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{ArimaOrder, LoadRecord, Zone};
use crate::error::{AppError, ErrorKind};
use crate::forecast::build_timestamp;
use crate::models::arima::{self, FittedArima};

/// A zone's fitted model together with the timestamp of every training row.
///
/// Rows are positions in the ARIMA series, so timestamps are looked up here
/// rather than derived from elapsed time; duplicated or missing instants in
/// the training table stay aligned with the series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneModel {
    timestamps: Vec<DateTime<Utc>>,
    pub arima: FittedArima,
}

impl ZoneModel {
    pub fn new(timestamps: Vec<DateTime<Utc>>, arima: FittedArima) -> Result<Self, AppError> {
        if timestamps.len() != arima.n_obs() {
            return Err(AppError::new(
                ErrorKind::ModelFit,
                format!(
                    "{} timestamps for {} observations.",
                    timestamps.len(),
                    arima.n_obs()
                ),
            ));
        }
        if timestamps.windows(2).any(|w| w[0] > w[1]) {
            return Err(AppError::new(
                ErrorKind::ModelFit,
                "Training timestamps are not in ascending order.",
            ));
        }
        Ok(Self { timestamps, arima })
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.timestamps.first().copied()
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.timestamps.last().copied()
    }

    /// Series position answering a query at `ts`.
    ///
    /// Inside the training window this is the last row stamped at or before
    /// `ts`. Past the last row it is `n - 1 + k`, where `k` counts whole
    /// `freq_secs` periods after the last training timestamp, so the first
    /// period after training is the one-step forecast.
    pub fn position(&self, ts: DateTime<Utc>, freq_secs: i64) -> Result<usize, AppError> {
        let (Some(start), Some(end)) = (self.start(), self.end()) else {
            return Err(AppError::new(ErrorKind::MalformedInput, "Zone model has no training rows."));
        };
        if self.timestamps.len() != self.arima.n_obs() {
            return Err(AppError::new(
                ErrorKind::MalformedInput,
                "Zone model timestamps do not match its series.",
            ));
        }
        if ts < start {
            return Err(AppError::new(
                ErrorKind::InvalidParameter,
                format!(
                    "Requested time {} precedes training start {}.",
                    ts.to_rfc3339(),
                    start.to_rfc3339()
                ),
            ));
        }
        if ts <= end {
            return Ok(self.timestamps.partition_point(|t| *t <= ts) - 1);
        }
        let steps = (ts - end).num_seconds() / freq_secs;
        Ok(self.timestamps.len() - 1 + steps as usize)
    }
}

/// Outcome of fitting one zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ZoneFit {
    Fitted(ZoneModel),
    Failed { reason: String },
}

/// Fitted and failed zones of a bundle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitReport {
    pub fitted: Vec<Zone>,
    pub failed: Vec<(Zone, String)>,
}

impl FitReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && !self.fitted.is_empty()
    }
}

/// The persisted model bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiSeriesModel {
    pub order: ArimaOrder,
    /// Sampling period used to turn timestamps into series positions.
    pub freq_secs: i64,
    zones: BTreeMap<Zone, ZoneFit>,
}

impl MultiSeriesModel {
    pub fn new(order: ArimaOrder, freq_secs: i64) -> Self {
        Self {
            order,
            freq_secs,
            zones: BTreeMap::new(),
        }
    }

    /// Fit every zone present in `records` (canonical order: sorted by time).
    ///
    /// Zones are fitted independently and in parallel; one zone failing does
    /// not affect the others. Each call replaces the fits of the zones it sees.
    pub fn fit_all(&mut self, records: &[LoadRecord]) -> Result<FitReport, AppError> {
        if records.is_empty() {
            return Err(AppError::new(ErrorKind::NoData, "No records to fit."));
        }
        if self.freq_secs <= 0 {
            return Err(AppError::new(
                ErrorKind::InvalidParameter,
                "Sampling period must be > 0 seconds.",
            ));
        }

        let mut groups: BTreeMap<Zone, (Vec<DateTime<Utc>>, Vec<f64>)> = BTreeMap::new();
        for r in records {
            let (stamps, loads) = groups.entry(r.zone).or_default();
            stamps.push(r.datetime);
            loads.push(r.load);
        }

        let order = self.order;
        let outcomes: Vec<(Zone, ZoneFit)> = groups
            .into_par_iter()
            .map(|(zone, (timestamps, series))| {
                let fitted = arima::fit(order, &series).and_then(|arima| ZoneModel::new(timestamps, arima));
                let fit = match fitted {
                    Ok(model) => {
                        info!(
                            zone = %zone,
                            n_obs = series.len(),
                            sigma2 = model.arima.sigma2,
                            aic = model.arima.aic,
                            "Fitted {order}"
                        );
                        ZoneFit::Fitted(model)
                    }
                    Err(err) => {
                        warn!(zone = %zone, n_obs = series.len(), error = %err, "Zone fit failed");
                        ZoneFit::Failed {
                            reason: err.message().to_string(),
                        }
                    }
                };
                (zone, fit)
            })
            .collect();

        self.zones.extend(outcomes);
        Ok(self.report())
    }

    /// Fit outcome of every zone in the bundle.
    pub fn report(&self) -> FitReport {
        let mut report = FitReport::default();
        for (zone, fit) in &self.zones {
            match fit {
                ZoneFit::Fitted(_) => report.fitted.push(*zone),
                ZoneFit::Failed { reason } => report.failed.push((*zone, reason.clone())),
            }
        }
        report
    }

    /// Forecast for `zone` at the instant built from `date` and `time`.
    pub fn predict(&self, date: &str, time: &str, zone: Zone) -> Result<f64, AppError> {
        let ts = build_timestamp(date, time)?;
        self.predict_at(ts, zone)
    }

    /// Forecast for `zone` at `ts`. Timestamps past the training window are
    /// extrapolated without a horizon limit.
    pub fn predict_at(&self, ts: DateTime<Utc>, zone: Zone) -> Result<f64, AppError> {
        if self.freq_secs <= 0 {
            return Err(AppError::new(
                ErrorKind::InvalidParameter,
                format!("Bundle sampling period must be > 0 seconds, got {}.", self.freq_secs),
            ));
        }
        let model = self.zone_model(zone)?;
        let position = model
            .position(ts, self.freq_secs)
            .map_err(|e| AppError::new(e.kind(), format!("Zone {zone}: {}", e.message())))?;
        let value = model.arima.predict_at(position);
        if !value.is_finite() {
            return Err(AppError::new(
                ErrorKind::ModelFit,
                format!("Forecast for zone {zone} is not finite."),
            ));
        }
        Ok(value)
    }

    pub fn zone_model(&self, zone: Zone) -> Result<&ZoneModel, AppError> {
        match self.zones.get(&zone) {
            Some(ZoneFit::Fitted(model)) => Ok(model),
            Some(ZoneFit::Failed { reason }) => Err(AppError::new(
                ErrorKind::NotFound,
                format!("Zone {zone} has no fitted model (fit failed: {reason})."),
            )),
            None => Err(AppError::new(
                ErrorKind::NotFound,
                format!("No fitted model for zone {zone}."),
            )),
        }
    }

    pub fn zones(&self) -> impl Iterator<Item = (Zone, &ZoneFit)> {
        self.zones.iter().map(|(z, f)| (*z, f))
    }

    pub fn fitted_zones(&self) -> Vec<Zone> {
        self.zones
            .iter()
            .filter(|(_, f)| matches!(f, ZoneFit::Fitted(_)))
            .map(|(z, _)| *z)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}
