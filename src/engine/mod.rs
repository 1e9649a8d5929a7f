// src/engine/mod.rs

//! Pipeline orchestration.
//!
//! [`run`] composes credential staging, environment resolution, process
//! execution and log processing for a single pipeline; [`outcome`] is the
//! pure final step that turns an exit code into success or failure.

pub mod outcome;
pub mod run;

pub use outcome::aggregate;
pub use run::{RunRequest, run_pipeline};
