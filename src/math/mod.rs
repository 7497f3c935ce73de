//! Mathematical utilities: least squares, differencing, and correlation diagnostics.

pub mod diff;
pub mod ols;
pub mod stats;

pub use diff::*;
pub use ols::*;
pub use stats::*;
