//! Input helpers.
//!
//! - CSV ingest of observations, cohort sizes and DAU totals (`ingest`)

pub mod ingest;

pub use ingest::*;
