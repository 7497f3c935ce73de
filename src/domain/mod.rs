//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - PJM zone codes and the canonical load record (`Zone`, `LoadRecord`)
//! - the fixed model order (`ArimaOrder`)
//! - environment-resolved run configuration (`TrainingPaths`, `Hyperparameters`, `ServeConfig`)

pub mod config;
pub mod types;

pub use config::*;
pub use types::*;
