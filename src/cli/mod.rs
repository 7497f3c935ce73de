//! Command-line parsing for the PJM load forecaster.
//!
//! Argument parsing and command dispatch stay separate from the pipeline and
//! model code; `app` turns these structs into calls.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::domain::Zone;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "lf", version, about = "PJM zonal load forecasting (per-zone ARIMA)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the training pipeline (load -> transform -> fit) on env-resolved paths.
    Train,
    /// Serve `/ping` and `/invocations` over HTTP.
    Serve,
    /// One-shot forecast from a saved model bundle.
    Predict(PredictArgs),
    /// Send a forecast request to a deployed endpoint and print the reply.
    Remote(RemoteArgs),
    /// Write synthetic PJM-style CSVs for local runs.
    Synth(SynthArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct PredictArgs {
    /// Date, e.g. 2021-02-01 or 2021-02-1.
    pub date: String,

    /// Time of day, HH:MM (24h, UTC).
    pub time: String,

    /// PJM zone code.
    #[arg(long, value_parser = parse_zone)]
    pub area: Zone,

    /// Model bundle (model.json).
    #[arg(long = "model-path", visible_alias = "model_path", value_name = "JSON")]
    pub model_path: PathBuf,
}

#[derive(Debug, Parser, Clone)]
pub struct RemoteArgs {
    pub date: String,
    pub time: String,
    #[arg(value_parser = parse_zone)]
    pub area: Zone,
    /// Endpoint URL, e.g. http://localhost:8080/invocations.
    pub url: String,
}

#[derive(Debug, Parser, Clone)]
pub struct SynthArgs {
    /// Output directory for the generated CSVs.
    #[arg(long)]
    pub out: PathBuf,

    /// Number of days to generate (one file per day).
    #[arg(long, default_value_t = 7)]
    pub days: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// First day (UTC).
    #[arg(long, default_value = "2021-02-01")]
    pub start: NaiveDate,
}

fn parse_zone(raw: &str) -> Result<Zone, String> {
    raw.parse::<Zone>().map_err(|e| e.to_string())
}
