//! Reporting: forecast/fit text formatting and the diagnostics bundle.

pub mod diagnostics;
pub mod format;

pub use diagnostics::*;
pub use format::*;
