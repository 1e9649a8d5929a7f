// src/logs/mod.rs

//! Handling of the child's NDJSON log stream.
//!
//! - [`record`] defines parsed records, error-log entries and the run result.
//! - [`sink`] is the seam to the outside logging system.
//! - [`processor`] classifies lines and accumulates the result.

pub mod processor;
pub mod record;
pub mod sink;

pub use processor::{LogProcessor, process_lines};
pub use record::{LogEntry, LogEvent, RunResult};
pub use sink::{Level, RunSink, TracingSink};
