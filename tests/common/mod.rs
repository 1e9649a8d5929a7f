#![allow(dead_code)]

pub use meltrun_test_utils::{
    CatalogBuilder, FakeMeltano, PipelineBuilder, PluginBuilder, RecordingSink, init_tracing,
    with_timeout,
};

use serde_json::Value;

/// One NDJSON line as meltano would print it.
pub fn json_line(value: Value) -> Vec<u8> {
    let mut line = serde_json::to_vec(&value).expect("serialize log line");
    line.push(b'\n');
    line
}
