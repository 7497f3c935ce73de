//! Data sources for local runs.

pub mod sample;

pub use sample::*;
