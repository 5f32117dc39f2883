//! Input data sources.
//!
//! Real observations come in through [`crate::io`]; this module generates
//! synthetic ones.

pub mod sample;

pub use sample::*;
