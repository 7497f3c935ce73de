//! Input/output helpers.
//!
//! - raw PJM CSV ingest (`ingest`)
//! - canonical training table read/write (`table`)
//! - model bundle JSON read/write (`bundle`)

pub mod bundle;
pub mod ingest;
pub mod table;

pub use bundle::*;
pub use ingest::*;
pub use table::*;
