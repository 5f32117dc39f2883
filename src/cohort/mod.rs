//! Cohort DAU projections.
//!
//! Everything here reads a finished [`crate::fit::RetentionProfile`]:
//!
//! - single-cohort trajectories and the forward-DAU table (plus DNU and totals)
//! - target seeking on top of the forward table
//! - at-least-age / exact-age DAU tables
//! - combining DAU totals from separate runs

pub mod aged;
pub mod combine;
pub mod project;
pub mod target;

pub use aged::*;
pub use combine::*;
pub use project::*;
pub use target::target_ramp;
