// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`command`] builds the `meltano run` argument vector.
//! - [`runner`] spawns the child with an exact environment and streams its
//!   merged stdout/stderr back line by line, honouring cancellation.

pub mod command;
pub mod runner;

pub use command::{DEFAULT_EXECUTABLE, pipeline_argv, run_command};
pub use runner::{CancelSignal, LaunchSpec, MeltanoProcess, RunnerOutcome};
