//! Table transforms applied between loading and fitting.

pub mod seasonal;

pub use seasonal::*;
