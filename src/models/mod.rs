//! Forecasting models.
//!
//! - `arima`: single-series ARIMA(p, d, q) estimation and forecasting
//! - `multi`: one ARIMA per zone, the persisted model bundle

pub mod arima;
pub mod multi;

pub use arima::FittedArima;
pub use multi::*;
