//! Terminal formatting for forecasts and fit summaries.
//!
//! Formatting lives here so the CLI and the HTTP handler render forecasts
//! identically, and so the model code only ever returns raw numbers.

use crate::models::{FitReport, MultiSeriesModel, ZoneFit};

/// `"<value> MW"` with two decimals.
pub fn format_forecast(value: f64) -> String {
    format!("{value:.2} MW")
}

/// Per-zone fit table printed at the end of a training run.
pub fn format_fit_summary(model: &MultiSeriesModel, report: &FitReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "=== lf - PJM load {} fit ===\n",
        model.order
    ));
    out.push_str(&format!(
        "Zones: fitted={} failed={} | freq={}s\n\n",
        report.fitted.len(),
        report.failed.len(),
        model.freq_secs
    ));

    out.push_str(
        format!(
            "{:<8} {:>7} {:>10} {:>10} {:>12} {:>12} {:>10}\n",
            "zone", "n", "ar", "ma", "sigma2", "aic", "ljung_box"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<8} {:-<7} {:-<10} {:-<10} {:-<12} {:-<12} {:-<10}\n",
            "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for (zone, fit) in model.zones() {
        match fit {
            ZoneFit::Fitted(zm) => {
                let a = &zm.arima;
                out.push_str(
                    format!(
                        "{:<8} {:>7} {:>10} {:>10} {:>12.3} {:>12.2} {:>10.2}\n",
                        zone.code(),
                        a.n_obs(),
                        fmt_vec(&a.ar),
                        fmt_vec(&a.ma),
                        a.sigma2,
                        a.aic,
                        a.ljung_box
                    )
                    .trim_end(),
                );
            }
            ZoneFit::Failed { reason } => {
                out.push_str(&format!("{:<8} failed: {}", zone.code(), truncate(reason, 60)));
            }
        }
        out.push('\n');
    }

    out
}

pub(crate) fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.4}")).collect();
    format!("[{}]", parts.join(", "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
