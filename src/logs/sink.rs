// src/logs/sink.rs

//! Where classified log lines and run metadata go.
//!
//! The processor talks to a [`RunSink`] instead of calling `tracing`
//! directly, so tests can record exactly what was forwarded.

use std::str::FromStr;

use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::logs::record::LogEvent;

/// Severity of a forwarded line, as meltano names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Level {
    /// Unknown level names are forwarded at info.
    pub fn parse_lossy(s: &str) -> Self {
        s.parse().unwrap_or(Level::Info)
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warning" | "warn" => Ok(Level::Warning),
            "error" => Ok(Level::Error),
            "critical" | "fatal" => Ok(Level::Critical),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// Receiver for everything a run reports.
pub trait RunSink: Send {
    fn log(&mut self, level: Level, message: &str);

    /// Forward a structured record. Extra fields ride along; sinks that
    /// have nowhere to put them fall back to [`RunSink::log`].
    fn log_event(&mut self, level: Level, event: &LogEvent) {
        self.log(level, &event.event);
    }

    /// Attach run-level metadata (duration, failure details, versions).
    fn add_metadata(&mut self, metadata: Map<String, Value>);
}

/// Production sink: re-emits child output through `tracing` under the
/// `meltano` target and keeps the merged metadata.
#[derive(Debug, Clone, Default)]
pub struct TracingSink {
    pipeline: String,
    metadata: Map<String, Value>,
}

impl TracingSink {
    pub fn new(pipeline: impl Into<String>) -> Self {
        Self {
            pipeline: pipeline.into(),
            metadata: Map::new(),
        }
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }
}

impl RunSink for TracingSink {
    fn log(&mut self, level: Level, message: &str) {
        let pipeline = self.pipeline.as_str();
        match level {
            Level::Debug => debug!(target: "meltano", pipeline, "{message}"),
            Level::Info => info!(target: "meltano", pipeline, "{message}"),
            Level::Warning => warn!(target: "meltano", pipeline, "{message}"),
            Level::Error | Level::Critical => error!(target: "meltano", pipeline, "{message}"),
        }
    }

    fn log_event(&mut self, level: Level, event: &LogEvent) {
        if event.extra.is_empty() {
            return self.log(level, &event.event);
        }
        let pipeline = self.pipeline.as_str();
        let extra = Value::Object(event.extra.clone());
        let message = event.event.as_str();
        match level {
            Level::Debug => debug!(target: "meltano", pipeline, %extra, "{message}"),
            Level::Info => info!(target: "meltano", pipeline, %extra, "{message}"),
            Level::Warning => warn!(target: "meltano", pipeline, %extra, "{message}"),
            Level::Error | Level::Critical => {
                error!(target: "meltano", pipeline, %extra, "{message}")
            }
        }
    }

    fn add_metadata(&mut self, metadata: Map<String, Value>) {
        debug!(pipeline = %self.pipeline, ?metadata, "run metadata");
        self.metadata.extend(metadata);
    }
}
