//! Markdown diagnostics bundle written after a successful fit.
//!
//! Per zone: fit statistics, ACF/PACF of the differenced load, and text plots
//! of the load and of the conditional residuals.

use std::fs::{create_dir_all, write};
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::math::{autocorrelation, difference, partial_autocorrelation};
use crate::models::{MultiSeriesModel, ZoneFit};
use crate::error::{AppError, ErrorKind};
use crate::plot::{Series, render_time_plot};
use crate::report::format::fmt_vec;

pub const DIAGNOSTICS_FILE: &str = "diagnostics.md";
const MAX_LAG: usize = 30;
const PLOT_WIDTH: usize = 96;
const PLOT_HEIGHT: usize = 16;

/// Write `<dir>/diagnostics.md` and return its path.
pub fn write_diagnostics(dir: &Path, model: &MultiSeriesModel) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| {
        AppError::new(
            ErrorKind::Io,
            format!("Failed to create diagnostics dir '{}': {e}", dir.display()),
        )
    })?;
    let path = dir.join(DIAGNOSTICS_FILE);
    write(&path, render_diagnostics(model)).map_err(|e| {
        AppError::new(
            ErrorKind::Io,
            format!("Failed to write diagnostics '{}': {e}", path.display()),
        )
    })?;
    Ok(path)
}

pub fn render_diagnostics(model: &MultiSeriesModel) -> String {
    let mut out = String::new();
    out.push_str("# lf diagnostics\n");
    out.push_str(&format!("- generated: {}\n", Utc::now().to_rfc3339()));
    out.push_str(&format!("- order: {}\n", model.order));
    out.push_str(&format!("- freq_secs: {}\n", model.freq_secs));

    for (zone, fit) in model.zones() {
        out.push_str(&format!("\n## Zone {zone}\n"));
        let zm = match fit {
            ZoneFit::Fitted(zm) => zm,
            ZoneFit::Failed { reason } => {
                out.push_str(&format!("Fit failed: {reason}\n"));
                continue;
            }
        };
        let a = &zm.arima;

        out.push_str("| start | n | constant | ar | ma | sigma2 | loglik | aic | bic | ljung_box | iters |\n");
        out.push_str("| - | - | - | - | - | - | - | - | - | - | - |\n");
        out.push_str(&format!(
            "| {} | {} | {:.4} | {} | {} | {:.4} | {:.3} | {:.3} | {:.3} | {:.3} (lags={}) | {} |\n",
            zm.start().map(|t| t.to_rfc3339()).unwrap_or_default(),
            a.n_obs(),
            a.constant,
            fmt_vec(&a.ar),
            fmt_vec(&a.ma),
            a.sigma2,
            a.log_likelihood,
            a.aic,
            a.bic,
            a.ljung_box,
            a.ljung_box_lags,
            a.iterations
        ));

        let w = difference(a.series(), a.order.d);
        let acf = autocorrelation(&w, MAX_LAG);
        let pacf = partial_autocorrelation(&w, MAX_LAG);
        out.push_str(&format!("\n### ACF / PACF (d={})\n", a.order.d));
        out.push_str("| lag | acf | pacf |\n| - | - | - |\n");
        for lag in 1..acf.len() {
            let p = pacf.get(lag - 1).copied().unwrap_or(f64::NAN);
            out.push_str(&format!("| {lag} | {:.4} | {p:.4} |\n", acf[lag]));
        }

        let fitted = a.fitted_values();
        out.push_str("\n### Load (`-` observed, `.` one-step fitted)\n```text\n");
        out.push_str(&render_time_plot(
            &format!("{zone} load"),
            &[
                Series { values: a.series(), glyph: '-' },
                Series { values: &fitted, glyph: '.' },
            ],
            PLOT_WIDTH,
            PLOT_HEIGHT,
        ));
        out.push_str("```\n");

        out.push_str("\n### Residuals\n```text\n");
        out.push_str(&render_time_plot(
            &format!("{zone} residuals"),
            &[Series { values: a.residuals(), glyph: '*' }],
            PLOT_WIDTH,
            PLOT_HEIGHT,
        ));
        out.push_str("```\n");
    }

    out
}
