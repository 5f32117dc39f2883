//! CurveFamily registry: the parametric retention families plus interpolation.
//!
//! Families are implemented as small, pure functions so that fitting/search code can
//! stay generic.

pub mod model;

pub use model::*;
