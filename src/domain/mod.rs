//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - curve family and form selectors (`FamilyKind`, `CurveForm`, `FormSpec`)
//! - validated retention observations (`RetentionData`)
//! - cohorts and projection options (`Cohort`, `ProjectionConfig`, `TargetConfig`)
//! - the input validation layer

pub mod types;
pub mod validation;

pub use types::*;
pub use validation::*;
