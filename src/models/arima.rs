//! ARIMA(p, d, q) estimation and forecasting for a single series.
//!
//! The model is written on the d-times differenced series `w`:
//!
//! ```text
//! w_t = c + Σ_{i=1..p} φ_i w_{t-i} + e_t + Σ_{j=1..q} θ_j e_{t-j}
//! ```
//!
//! The constant `c` is only estimated for `d = 0`; integrated models carry no
//! trend term.
//!
//! Estimation is Hannan–Rissanen:
//! 1. fit a long AR(m) by least squares to get residual estimates `ê`
//! 2. regress `w_t` on `p` lags of `w` and `q` lags of `ê`
//! 3. iterate: recompute conditional residuals with the current coefficients
//!    and re-regress until the coefficients settle
//!
//! Forecasts set future shocks to zero and integrate back to the level scale.

use serde::{Deserialize, Serialize};

use crate::domain::ArimaOrder;
use crate::error::{AppError, ErrorKind};
use crate::math::{difference, integrate_step, ljung_box, regress};

/// Bound applied to every AR/MA coefficient to stay stationary/invertible.
const MAX_COEF: f64 = 0.995;
/// Upper bound for the long-AR order used in stage 1.
const MAX_LONG_AR: usize = 20;
const MAX_ITERS: usize = 25;
const CONVERGENCE_TOL: f64 = 1e-8;
/// Residual variance floor; keeps likelihood-based criteria finite on exact fits.
const SIGMA2_FLOOR: f64 = 1e-12;

/// A fitted ARIMA model together with the data it was fitted on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedArima {
    pub order: ArimaOrder,
    pub constant: f64,
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    /// Residual variance (conditional sum of squares / effective observations).
    pub sigma2: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    pub ljung_box: f64,
    pub ljung_box_lags: usize,
    /// Refinement iterations performed after the initial Hannan–Rissanen step.
    pub iterations: usize,
    series: Vec<f64>,
    residuals: Vec<f64>,
}

/// Fit `order` to `series` (levels, in observation order).
pub fn fit(order: ArimaOrder, series: &[f64]) -> Result<FittedArima, AppError> {
    let ArimaOrder { p, d, q } = order;

    if let Some(idx) = series.iter().position(|v| !v.is_finite()) {
        return Err(AppError::new(
            ErrorKind::ModelFit,
            format!("Non-finite observation at position {idx}."),
        ));
    }

    let w = difference(series, d);
    let nw = w.len();
    let with_const = d == 0;
    let m = if q > 0 {
        (p + q).max((nw / 4).min(MAX_LONG_AR))
    } else {
        0
    };
    let required = 2 * m + p + q + 2 + usize::from(with_const);
    if nw < required {
        return Err(AppError::new(
            ErrorKind::ModelFit,
            format!(
                "Insufficient data for {order}: {} observations, need at least {}.",
                series.len(),
                required + d
            ),
        ));
    }

    // Stage 1: long autoregression for residual estimates.
    let e_hat = if q > 0 {
        long_ar_residuals(&w, m, with_const)?
    } else {
        vec![0.0; nw]
    };

    // Stage 2: regression on lagged values and lagged residual estimates.
    let start = m + p.max(q);
    let mut params = regress_arma(&w, &e_hat, p, q, with_const, start).ok_or_else(|| {
        AppError::new(ErrorKind::ModelFit, format!("Singular regression while fitting {order}."))
    })?;
    params.clip();

    // Stage 3: refine with conditional residuals.
    let mut iterations = 0;
    if q > 0 {
        for _ in 0..MAX_ITERS {
            let e = conditional_residuals(&w, &params);
            let Some(mut next) = regress_arma(&w, &e, p, q, with_const, p.max(q)) else {
                break;
            };
            next.clip();
            iterations += 1;
            let delta = params.max_abs_delta(&next);
            params = next;
            if delta < CONVERGENCE_TOL {
                break;
            }
        }
    }

    if !params.is_finite() {
        return Err(AppError::new(
            ErrorKind::ModelFit,
            format!("Estimation of {order} did not converge (non-finite coefficients)."),
        ));
    }

    let residuals = conditional_residuals(&w, &params);
    let n_eff = nw - p;
    let sse: f64 = residuals[p..].iter().map(|e| e * e).sum();
    if !sse.is_finite() {
        return Err(AppError::new(
            ErrorKind::ModelFit,
            format!("Estimation of {order} diverged (non-finite residuals)."),
        ));
    }

    let sigma2 = (sse / n_eff as f64).max(SIGMA2_FLOOR);
    let n_f = n_eff as f64;
    let log_likelihood = -0.5 * n_f * ((2.0 * std::f64::consts::PI * sigma2).ln() + 1.0);
    let k = (p + q + usize::from(with_const) + 1) as f64;
    let aic = -2.0 * log_likelihood + 2.0 * k;
    let bic = -2.0 * log_likelihood + k * n_f.ln();
    let ljung_box_lags = (n_eff / 5).clamp(1, 10);
    let lb = ljung_box(&residuals[p..], ljung_box_lags);

    Ok(FittedArima {
        order,
        constant: params.constant,
        ar: params.ar,
        ma: params.ma,
        sigma2,
        log_likelihood,
        aic,
        bic,
        ljung_box: lb,
        ljung_box_lags,
        iterations,
        series: series.to_vec(),
        residuals,
    })
}

impl FittedArima {
    pub fn n_obs(&self) -> usize {
        self.series.len()
    }

    /// Training series (levels).
    pub fn series(&self) -> &[f64] {
        &self.series
    }

    /// Conditional residuals on the differenced scale (leading `p` entries are zero).
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// Prediction at series position `position` (0 = first training observation).
    ///
    /// Inside the training window this is the one-step-ahead prediction; past it,
    /// a recursive forecast `position - n_obs + 1` steps ahead.
    pub fn predict_at(&self, position: usize) -> f64 {
        let n = self.series.len();
        if position >= n {
            return self.forecast_state().nth(position - n).unwrap_or(f64::NAN);
        }

        let w = difference(&self.series[..=position], self.order.d);
        self.predict_in_sample(&w, position)
    }

    /// Forecast the next `steps` levels after the training window.
    pub fn forecast(&self, steps: usize) -> Vec<f64> {
        self.forecast_state().take(steps).collect()
    }

    /// In-sample one-step-ahead predictions for every training position.
    pub fn fitted_values(&self) -> Vec<f64> {
        let w = difference(&self.series, self.order.d);
        (0..self.series.len())
            .map(|i| self.predict_in_sample(&w, i))
            .collect()
    }

    /// `w` is the differenced series covering at least `..=position`.
    fn predict_in_sample(&self, w: &[f64], position: usize) -> f64 {
        let d = self.order.d;
        if position < d + self.order.p {
            return self.series[position];
        }
        let j = position - d;
        let w_hat = self.one_step(&w[..j], &self.residuals[..j]);
        integrate_step(&self.series[..position], w_hat, d)
    }

    fn one_step(&self, w_hist: &[f64], e_hist: &[f64]) -> f64 {
        let t = w_hist.len();
        let mut pred = self.constant;
        for (i, phi) in self.ar.iter().enumerate() {
            if let Some(idx) = t.checked_sub(i + 1) {
                pred += phi * w_hist[idx];
            }
        }
        let te = e_hist.len();
        for (j, theta) in self.ma.iter().enumerate() {
            if let Some(idx) = te.checked_sub(j + 1) {
                pred += theta * e_hist[idx];
            }
        }
        pred
    }

    fn forecast_state(&self) -> ForecastIter<'_> {
        let d = self.order.d;
        let w = difference(&self.series, d);
        let keep_w = self.order.p.max(1);
        let keep_e = self.order.q.max(1);
        ForecastIter {
            model: self,
            w_tail: tail(&w, keep_w),
            e_tail: tail(&self.residuals, keep_e),
            level_tail: tail(&self.series, d.max(1)),
        }
    }
}

/// Recursive multi-step forecast that only keeps the lags it needs.
struct ForecastIter<'a> {
    model: &'a FittedArima,
    w_tail: Vec<f64>,
    e_tail: Vec<f64>,
    level_tail: Vec<f64>,
}

impl Iterator for ForecastIter<'_> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let d = self.model.order.d;
        let w_hat = self.model.one_step(&self.w_tail, &self.e_tail);
        let level = integrate_step(&self.level_tail, w_hat, d);

        push_bounded(&mut self.w_tail, w_hat);
        push_bounded(&mut self.e_tail, 0.0);
        push_bounded(&mut self.level_tail, level);
        Some(level)
    }
}

fn tail(values: &[f64], keep: usize) -> Vec<f64> {
    values[values.len().saturating_sub(keep)..].to_vec()
}

fn push_bounded(buf: &mut Vec<f64>, value: f64) {
    if !buf.is_empty() {
        buf.remove(0);
    }
    buf.push(value);
}

#[derive(Debug, Clone, PartialEq)]
struct ArmaParams {
    constant: f64,
    ar: Vec<f64>,
    ma: Vec<f64>,
}

impl ArmaParams {
    fn clip(&mut self) {
        for c in self.ar.iter_mut().chain(self.ma.iter_mut()) {
            *c = c.clamp(-MAX_COEF, MAX_COEF);
        }
    }

    fn is_finite(&self) -> bool {
        self.constant.is_finite() && self.ar.iter().chain(self.ma.iter()).all(|c| c.is_finite())
    }

    fn max_abs_delta(&self, other: &ArmaParams) -> f64 {
        let mut delta = (self.constant - other.constant).abs();
        for (a, b) in self.ar.iter().zip(&other.ar).chain(self.ma.iter().zip(&other.ma)) {
            delta = delta.max((a - b).abs());
        }
        delta
    }
}

fn long_ar_residuals(w: &[f64], m: usize, with_const: bool) -> Result<Vec<f64>, AppError> {
    let mut rows = Vec::with_capacity(w.len() - m);
    let mut y = Vec::with_capacity(w.len() - m);
    for t in m..w.len() {
        let mut row = Vec::with_capacity(m + 1);
        if with_const {
            row.push(1.0);
        }
        row.extend((1..=m).map(|i| w[t - i]));
        rows.push(row);
        y.push(w[t]);
    }
    let beta = regress(&rows, &y).ok_or_else(|| {
        AppError::new(ErrorKind::ModelFit, format!("Singular long AR({m}) regression."))
    })?;

    let mut e_hat = vec![0.0; w.len()];
    for (offset, (row, target)) in rows.iter().zip(&y).enumerate() {
        let fitted: f64 = row.iter().zip(&beta).map(|(x, b)| x * b).sum();
        e_hat[m + offset] = target - fitted;
    }
    Ok(e_hat)
}

fn regress_arma(
    w: &[f64],
    e: &[f64],
    p: usize,
    q: usize,
    with_const: bool,
    start: usize,
) -> Option<ArmaParams> {
    let mut rows = Vec::with_capacity(w.len().saturating_sub(start));
    let mut y = Vec::with_capacity(w.len().saturating_sub(start));
    for t in start..w.len() {
        let mut row = Vec::with_capacity(p + q + 1);
        if with_const {
            row.push(1.0);
        }
        row.extend((1..=p).map(|i| w[t - i]));
        row.extend((1..=q).map(|j| e[t - j]));
        rows.push(row);
        y.push(w[t]);
    }

    if p + q == 0 {
        // Nothing to regress on: white noise around the constant (or zero).
        let constant = if with_const { crate::math::mean(&y) } else { 0.0 };
        return Some(ArmaParams {
            constant,
            ar: Vec::new(),
            ma: Vec::new(),
        });
    }

    let beta = regress(&rows, &y)?;
    let offset = usize::from(with_const);
    Some(ArmaParams {
        constant: if with_const { beta[0] } else { 0.0 },
        ar: beta[offset..offset + p].to_vec(),
        ma: beta[offset + p..offset + p + q].to_vec(),
    })
}

/// Conditional residuals: `e_t = 0` for `t < p`, then the one-step errors.
fn conditional_residuals(w: &[f64], params: &ArmaParams) -> Vec<f64> {
    let p = params.ar.len();
    let mut e = vec![0.0; w.len()];
    for t in p..w.len() {
        let mut pred = params.constant;
        for (i, phi) in params.ar.iter().enumerate() {
            pred += phi * w[t - i - 1];
        }
        for (j, theta) in params.ma.iter().enumerate() {
            if let Some(idx) = t.checked_sub(j + 1) {
                pred += theta * e[idx];
            }
        }
        e[t] = w[t] - pred;
    }
    e
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand::rngs::StdRng;
    use rand_distr::Normal;

    fn simulate_arima_111(phi: f64, theta: f64, n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0, 1.0).unwrap();
        let mut level = 1000.0;
        let mut w_prev = 0.0;
        let mut e_prev = 0.0;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            let e = normal.sample(&mut rng);
            let w = phi * w_prev + e + theta * e_prev;
            level += w;
            out.push(level);
            w_prev = w;
            e_prev = e;
        }
        out
    }

    #[test]
    fn recovers_arima_111_coefficients() {
        let series = simulate_arima_111(0.6, 0.3, 3000, 7);
        let fit = fit(ArimaOrder::default(), &series).unwrap();
        assert!((fit.ar[0] - 0.6).abs() < 0.1, "phi = {}", fit.ar[0]);
        assert!((fit.ma[0] - 0.3).abs() < 0.1, "theta = {}", fit.ma[0]);
        assert!((fit.sigma2 - 1.0).abs() < 0.15, "sigma2 = {}", fit.sigma2);
        assert_eq!(fit.constant, 0.0);
        assert!(fit.aic.is_finite() && fit.bic.is_finite());
        assert!(fit.bic > fit.aic);
    }

    #[test]
    fn pure_ar_is_exact_least_squares() {
        // w_t = 0.5 w_{t-1} exactly, so AR(1) on the first difference is exact.
        let mut series = vec![100.0, 116.0];
        for _ in 0..40 {
            let n = series.len();
            let w = series[n - 1] - series[n - 2];
            series.push(series[n - 1] + 0.5 * w);
        }
        let fit = fit(ArimaOrder { p: 1, d: 1, q: 0 }, &series).unwrap();
        assert!((fit.ar[0] - 0.5).abs() < 1e-9);
        assert_eq!(fit.sigma2, SIGMA2_FLOOR);

        // Forecast continues the geometric decay of the increments.
        let last = *series.last().unwrap();
        let last_w = last - series[series.len() - 2];
        let next = fit.forecast(1)[0];
        assert!((next - (last + 0.5 * last_w)).abs() < 1e-6);
    }

    #[test]
    fn too_short_series_is_a_fit_error() {
        let err = fit(ArimaOrder::default(), &[10.0, 12.0, 11.0, 13.0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelFit);
        assert!(err.message().contains("Insufficient data"));
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let mut series = simulate_arima_111(0.2, 0.2, 100, 1);
        series[10] = f64::NAN;
        assert_eq!(fit(ArimaOrder::default(), &series).unwrap_err().kind(), ErrorKind::ModelFit);
    }

    #[test]
    fn predict_at_matches_forecast_past_the_window() {
        let series = simulate_arima_111(0.4, 0.2, 400, 3);
        let fit = fit(ArimaOrder::default(), &series).unwrap();
        let ahead = fit.forecast(5);
        assert_eq!(ahead.len(), 5);
        assert_eq!(fit.predict_at(series.len()), ahead[0]);
        assert_eq!(fit.predict_at(series.len() + 4), ahead[4]);
    }

    #[test]
    fn in_sample_predictions_track_the_series() {
        let series = simulate_arima_111(0.5, 0.1, 500, 11);
        let fit = fit(ArimaOrder::default(), &series).unwrap();
        let fitted = fit.fitted_values();
        assert_eq!(fitted.len(), series.len());
        // Warm-up positions echo the data.
        assert_eq!(fitted[0], series[0]);
        assert_eq!(fitted[1], series[1]);
        let mse: f64 = fitted
            .iter()
            .zip(&series)
            .skip(2)
            .map(|(f, y)| (f - y).powi(2))
            .sum::<f64>()
            / (series.len() - 2) as f64;
        assert!(mse < 1.5, "one-step mse = {mse}");
    }

    #[test]
    fn coefficients_stay_inside_the_unit_interval() {
        // Strongly alternating increments push the AR estimate towards -1.
        let series: Vec<f64> = (0..200)
            .map(|i| 500.0 + if i % 2 == 0 { 10.0 } else { -10.0 } + (i as f64) * 0.01)
            .collect();
        let fit = fit(ArimaOrder::default(), &series).unwrap();
        for c in fit.ar.iter().chain(&fit.ma) {
            assert!(c.abs() <= MAX_COEF);
        }
        assert!(fit.forecast(3).iter().all(|v| v.is_finite()));
    }

    #[test]
    fn stationary_model_estimates_constant() {
        // x_t = 5 + 0.5 x_{t-1} + e_t, mean 10.
        let mut rng = StdRng::seed_from_u64(5);
        let normal = Normal::new(0.0, 1.0).unwrap();
        let mut prev = 10.0;
        let series: Vec<f64> = (0..2000)
            .map(|_| {
                prev = 5.0 + 0.5 * prev + normal.sample(&mut rng);
                prev
            })
            .collect();
        let fit = fit(ArimaOrder { p: 1, d: 0, q: 0 }, &series).unwrap();
        assert!((fit.ar[0] - 0.5).abs() < 0.1, "phi = {}", fit.ar[0]);
        assert!((fit.constant - 5.0).abs() < 1.0, "c = {}", fit.constant);
    }
}
