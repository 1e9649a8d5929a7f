// src/logs/processor.rs

//! Line-by-line classification of meltano output.

use serde_json::{Map, Value};

use crate::logs::record::{LogEntry, LogEvent, RunResult};
use crate::logs::sink::{Level, RunSink};

const METRIC_TOKEN: &str = "METRIC";
const RUN_COMPLETED: &str = "Run completed";
const FAILURE_EVENTS: [&str; 3] = ["Extractor failed", "Loader failed", "Mappers failed"];
const FAILURE_FIELDS: [&str; 3] = ["code", "message", "exception"];

/// Consumes output lines in order, forwarding each to a [`RunSink`] and
/// accumulating the run's error/warning records and duration.
///
/// Classification is line-local; the only state carried between lines is
/// the [`RunResult`] being built.
pub struct LogProcessor<'s> {
    sink: &'s mut dyn RunSink,
    result: RunResult,
}

impl<'s> LogProcessor<'s> {
    pub fn new(sink: &'s mut dyn RunSink) -> Self {
        Self {
            sink,
            result: RunResult::default(),
        }
    }

    pub fn finish(self) -> RunResult {
        self.result
    }

    pub fn process_line(&mut self, line: &[u8]) {
        match LogEvent::parse(line) {
            Some(event) => self.process_event(event),
            None => self.process_text(line),
        }
    }

    fn process_text(&mut self, line: &[u8]) {
        let text = String::from_utf8_lossy(line);
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        self.sink.log(Level::Info, text);
        if text.to_lowercase().contains("error") {
            self.result.error_logs.push(LogEntry::Text(text.to_string()));
        }
    }

    fn process_event(&mut self, event: LogEvent) {
        if event.event.contains(METRIC_TOKEN) {
            self.sink.log(Level::Debug, &format_metric(&event));
        } else {
            self.sink.log_event(Level::parse_lossy(&event.level), &event);
        }

        if event.event.contains(RUN_COMPLETED) {
            if let Some(duration) = event.get("duration_seconds") {
                self.sink
                    .add_metadata(metadata(&[("duration_seconds", Some(duration))]));
                if let Some(secs) = duration.as_f64() {
                    self.result.duration_seconds = Some(secs);
                }
            }
        }

        if FAILURE_EVENTS.iter().any(|marker| event.event.contains(marker)) {
            let fields: Vec<_> = FAILURE_FIELDS
                .iter()
                .map(|&name| (name, event.get(name)))
                .collect();
            let details = metadata(&fields);
            if !details.is_empty() {
                self.sink.add_metadata(details);
            }
        }

        match event.level.as_str() {
            "error" => self.result.error_logs.push(LogEntry::Record(event)),
            "warning" => self.result.warning_logs.push(event),
            _ => {}
        }
    }
}

/// Classify a whole sequence of lines.
pub fn process_lines<I, L>(sink: &mut dyn RunSink, lines: I) -> RunResult
where
    I: IntoIterator<Item = L>,
    L: AsRef<[u8]>,
{
    let mut processor = LogProcessor::new(sink);
    for line in lines {
        processor.process_line(line.as_ref());
    }
    processor.finish()
}

/// `METRIC: k1=v1 k2=v2` from `metric_info`, or the bare event text.
fn format_metric(event: &LogEvent) -> String {
    match event.get("metric_info") {
        Some(Value::Object(info)) => {
            let parts: Vec<String> = info
                .iter()
                .map(|(k, v)| format!("{k}={}", literal_repr(v)))
                .collect();
            format!("{METRIC_TOKEN}: {}", parts.join(" "))
        }
        _ => event.event.clone(),
    }
}

/// Strings single-quoted, everything else as JSON.
fn literal_repr(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{s}'"),
        other => other.to_string(),
    }
}

fn metadata(fields: &[(&str, Option<&Value>)]) -> Map<String, Value> {
    fields
        .iter()
        .filter_map(|(k, v)| v.map(|v| (k.to_string(), v.clone())))
        .collect()
}
