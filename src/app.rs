//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - initialises logging
//! - parses CLI arguments
//! - dispatches to training, serving, or one-shot forecasting

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, PredictArgs, RemoteArgs, SynthArgs};
use crate::data::{SynthConfig, write_sample_csvs};
use crate::domain::{ServeConfig, TrainingPaths};
use crate::error::{AppError, ErrorKind};
use crate::forecast::{ForecastRequest, post_forecast, render_forecast};
use crate::io::load_bundle;
use crate::report::format_fit_summary;

pub mod pipeline;

/// Entry point for the `lf` binary.
pub fn run() -> Result<(), AppError> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Train => handle_train(),
        Command::Serve => handle_serve(),
        Command::Predict(args) => handle_predict(args),
        Command::Remote(args) => handle_remote(args),
        Command::Synth(args) => handle_synth(args),
    }
}

/// Logs go to stderr so stdout carries only command output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "pjm_load_forecast=info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_train() -> Result<(), AppError> {
    let paths = TrainingPaths::from_env();
    let bundle_path = pipeline::run_training(&paths)?;

    let model = load_bundle(&bundle_path)?;
    println!("{}", format_fit_summary(&model, &model.report()));
    Ok(())
}

fn handle_serve() -> Result<(), AppError> {
    let config = ServeConfig::from_env();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to start async runtime: {e}")))?;
    runtime.block_on(crate::server::run_server(config))
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    let model = load_bundle(&args.model_path)?;
    let req = ForecastRequest::new(args.date, args.time, args.area.code());
    println!("{}", render_forecast(&model, &req)?);
    Ok(())
}

fn handle_remote(args: RemoteArgs) -> Result<(), AppError> {
    let req = ForecastRequest::new(args.date, args.time, args.area.code());
    println!("{}", post_forecast(&args.url, &req)?);
    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let config = SynthConfig {
        start: args.start,
        days: args.days,
        seed: args.seed,
        ..SynthConfig::default()
    };
    let files = write_sample_csvs(&args.out, &config)?;
    println!("Wrote {} files to {}", files.len(), args.out.display());
    Ok(())
}
