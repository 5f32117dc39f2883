//! Retention curve fitting.
//!
//! Responsibilities:
//!
//! - build solver start grids per family
//! - fit every family (parallel) and drop the ones that fail
//! - score fits against whole-day observations and pick the best fit
//! - generate and repair the day-indexed projection
//! - assemble the immutable [`RetentionProfile`]

pub mod fitter;
pub mod profile;
pub mod projection;
pub mod selection;
pub mod start_grid;

pub use fitter::*;
pub use profile::*;
pub use projection::*;
pub use selection::*;
pub use start_grid::*;
