//! Correlation diagnostics for fitted series and residuals.

/// Arithmetic mean; `0.0` for an empty slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Sample autocorrelation for lags `0..=max_lag`.
///
/// Uses the biased (divide-by-n) autocovariance, so lag 0 is always `1.0` for a
/// non-constant series. A constant series yields zeros beyond lag 0.
pub fn autocorrelation(series: &[f64], max_lag: usize) -> Vec<f64> {
    let n = series.len();
    if n == 0 {
        return Vec::new();
    }
    let m = mean(series);
    let c0: f64 = series.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n as f64;
    let max_lag = max_lag.min(n - 1);

    let mut out = Vec::with_capacity(max_lag + 1);
    out.push(1.0);
    for lag in 1..=max_lag {
        if c0 <= 0.0 {
            out.push(0.0);
            continue;
        }
        let ck: f64 = (lag..n)
            .map(|t| (series[t] - m) * (series[t - lag] - m))
            .sum::<f64>()
            / n as f64;
        out.push(ck / c0);
    }
    out
}

/// Partial autocorrelation for lags `1..=max_lag` via Durbin–Levinson.
pub fn partial_autocorrelation(series: &[f64], max_lag: usize) -> Vec<f64> {
    let acf = autocorrelation(series, max_lag);
    let max_lag = acf.len().saturating_sub(1);

    let mut pacf = Vec::with_capacity(max_lag);
    let mut phi_prev: Vec<f64> = Vec::new();
    for k in 1..=max_lag {
        let num = acf[k] - (1..k).map(|j| phi_prev[j - 1] * acf[k - j]).sum::<f64>();
        let den = 1.0 - (1..k).map(|j| phi_prev[j - 1] * acf[j]).sum::<f64>();
        let phi_kk = if den.abs() < 1e-12 { 0.0 } else { num / den };

        let mut phi = Vec::with_capacity(k);
        for j in 1..k {
            phi.push(phi_prev[j - 1] - phi_kk * phi_prev[k - j - 1]);
        }
        phi.push(phi_kk);
        pacf.push(phi_kk);
        phi_prev = phi;
    }
    pacf
}

/// Ljung–Box portmanteau statistic over `lags` autocorrelations.
pub fn ljung_box(residuals: &[f64], lags: usize) -> f64 {
    let n = residuals.len();
    if n < 2 || lags == 0 {
        return 0.0;
    }
    let acf = autocorrelation(residuals, lags);
    let n_f = n as f64;
    acf.iter()
        .enumerate()
        .skip(1)
        .map(|(k, r)| r * r / (n_f - k as f64))
        .sum::<f64>()
        * n_f
        * (n_f + 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert!((mean(&[1.0, 2.0, 3.0, 4.0, 5.0]) - 3.0).abs() < 1e-10);
        assert!(mean(&[]).abs() < 1e-10);
    }

    #[test]
    fn acf_of_alternating_series_is_negative_at_lag_one() {
        let series: Vec<f64> = (0..50).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let acf = autocorrelation(&series, 2);
        assert_eq!(acf.len(), 3);
        assert!((acf[0] - 1.0).abs() < 1e-12);
        assert!(acf[1] < -0.9);
        assert!(acf[2] > 0.9);
    }

    #[test]
    fn constant_series_has_flat_acf() {
        let acf = autocorrelation(&[5.0; 10], 3);
        assert_eq!(acf, vec![1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn pacf_lag_one_matches_acf() {
        let series: Vec<f64> = (0..40).map(|i| ((i as f64) * 0.7).sin()).collect();
        let acf = autocorrelation(&series, 5);
        let pacf = partial_autocorrelation(&series, 5);
        assert_eq!(pacf.len(), 5);
        assert!((pacf[0] - acf[1]).abs() < 1e-12);
    }

    #[test]
    fn ljung_box_is_non_negative() {
        let series: Vec<f64> = (0..30).map(|i| ((i * 7919) % 13) as f64).collect();
        assert!(ljung_box(&series, 10) >= 0.0);
        assert_eq!(ljung_box(&[1.0], 10), 0.0);
    }
}
