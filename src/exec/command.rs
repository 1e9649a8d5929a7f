// src/exec/command.rs

//! Argument vector for `meltano run`. Flag names and their order are the
//! CLI's contract and must not change.

use crate::model::{Pipeline, RunFlags};
use crate::types::StateStrategy;

pub const DEFAULT_EXECUTABLE: &str = "meltano";

/// `meltano [--log-level=L] run --run-id=ID [flags...]`, without plugins.
pub fn run_command(
    executable: &str,
    flags: &RunFlags,
    run_id: &str,
    state_suffix: Option<&str>,
) -> Vec<String> {
    let mut argv = vec![executable.to_string()];

    if let Some(level) = flags.log_level.as_deref().filter(|l| !l.is_empty()) {
        argv.push(format!("--log-level={level}"));
    }

    argv.push("run".to_string());
    argv.push(format!("--run-id={run_id}"));

    if let Some(suffix) = state_suffix.filter(|s| !s.is_empty()) {
        argv.push(format!("--state-id-suffix={suffix}"));
    }
    if flags.full_refresh {
        argv.push("--full-refresh".to_string());
    }
    if flags.refresh_catalog {
        argv.push("--refresh-catalog".to_string());
    }
    if flags.state_strategy != StateStrategy::Auto {
        argv.push(format!("--state-strategy={}", flags.state_strategy));
    }

    argv
}

/// Full argv for running `pipeline`: the run command followed by the
/// extractor and loader names.
pub fn pipeline_argv(executable: &str, pipeline: &Pipeline, flags: &RunFlags, run_id: &str) -> Vec<String> {
    let mut argv = run_command(executable, flags, run_id, pipeline.state_suffix.as_deref());
    argv.push(pipeline.extractor.name.clone());
    argv.push(pipeline.loader.name.clone());
    argv
}
