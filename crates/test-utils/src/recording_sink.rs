use serde_json::{Map, Value};

use meltrun::logs::{Level, RunSink};

/// A sink that keeps everything it is given, in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub logs: Vec<(Level, String)>,
    pub metadata: Vec<Map<String, Value>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages forwarded at `level`.
    pub fn messages_at(&self, level: Level) -> Vec<&str> {
        self.logs
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.as_str())
            .collect()
    }

    /// All metadata calls merged, later keys winning.
    pub fn merged_metadata(&self) -> Map<String, Value> {
        let mut merged = Map::new();
        for m in &self.metadata {
            merged.extend(m.clone());
        }
        merged
    }
}

impl RunSink for RecordingSink {
    fn log(&mut self, level: Level, message: &str) {
        self.logs.push((level, message.to_string()));
    }

    fn add_metadata(&mut self, metadata: Map<String, Value>) {
        self.metadata.push(metadata);
    }
}
