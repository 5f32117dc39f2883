//! `retention-curves` library crate.
//!
//! Fits retention curves to `(day, retention %)` observations, projects the
//! selected curve forward, and turns cohort sizes into daily-active-user
//! forecasts. The binary (`dau`) is a thin wrapper around this library so the
//! core logic is testable without spawning processes.

pub mod app;
pub mod cli;
pub mod cohort;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
