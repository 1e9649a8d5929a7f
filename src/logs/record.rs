// src/logs/record.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One structured line of meltano output.
///
/// Only JSON objects whose `level` and `event` are strings qualify; every
/// other field is kept in `extra`, in the order it appeared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub level: String,
    pub event: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LogEvent {
    pub fn new(level: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            event: event.into(),
            extra: Map::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// `None` for anything that is not a structured record.
    pub fn parse(line: &[u8]) -> Option<Self> {
        serde_json::from_slice(line).ok()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

/// An entry of the error log: a structured record, or a raw text line that
/// mentioned an error.
#[derive(Debug, Clone, PartialEq)]
pub enum LogEntry {
    Record(LogEvent),
    Text(String),
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogEntry::Record(event) => {
                let text = serde_json::to_string(event).map_err(|_| fmt::Error)?;
                f.write_str(&text)
            }
            LogEntry::Text(text) => f.write_str(text),
        }
    }
}

/// Error and warning records gathered from a run, plus its reported duration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunResult {
    pub error_logs: Vec<LogEntry>,
    pub warning_logs: Vec<LogEvent>,
    pub duration_seconds: Option<f64>,
}
