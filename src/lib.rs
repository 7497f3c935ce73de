//! `pjm-load-forecast` library crate.
//!
//! The binary (`lf`) is a thin wrapper around this library so that:
//!
//! - the training pipeline and the forecast query are testable without
//!   spawning processes
//! - the CLI and the HTTP server share one forecast path

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod server;
pub mod transform;
