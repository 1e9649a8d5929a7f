// src/engine/run.rs

use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::env::naming::PROJECT_ROOT_VAR;
use crate::env::{EnvMap, EnvSource, PipelineEnv};
use crate::errors::{MeltrunError, Result};
use crate::exec::{CancelSignal, LaunchSpec, MeltanoProcess, RunnerOutcome, pipeline_argv};
use crate::logs::{Level, LogProcessor, RunResult, RunSink};
use crate::model::{Pipeline, PluginCatalog, RunFlags};
use crate::ssh::{DEPRECATED_KEYS_WARNING, SshStaging, collect_ssh_keys};
use crate::types::PluginType;

use super::outcome::aggregate;

/// Everything needed to launch one pipeline.
#[derive(Debug, Clone, Copy)]
pub struct RunRequest<'a> {
    pub pipeline: &'a Pipeline,
    pub catalog: &'a PluginCatalog,
    pub flags: &'a RunFlags,
    pub run_id: &'a str,
    pub executable: &'a str,
    /// Working directory for the child; inherited when `None`.
    pub project_dir: Option<&'a Path>,
    /// Starting environment. Never modified.
    pub base_env: &'a EnvMap,
    /// Where `{env = "..."}` references are resolved.
    pub lookup: &'a dyn EnvSource,
}

impl<'a> RunRequest<'a> {
    /// Argv and environment the child would get, given an optional staged
    /// SSH config.
    pub fn launch_spec(&self, ssh_config: Option<&Path>) -> Result<LaunchSpec> {
        validate(self.pipeline)?;

        let env = PipelineEnv::new(self.pipeline, self.flags)
            .with_definitions(
                self.catalog
                    .get(PluginType::Extractor, &self.pipeline.extractor.name),
                self.catalog.get(PluginType::Loader, &self.pipeline.loader.name),
            )
            .with_ssh_config(ssh_config)
            .build(self.base_env, self.lookup)?;

        Ok(LaunchSpec {
            argv: pipeline_argv(self.executable, self.pipeline, self.flags, self.run_id),
            cwd: self.project_dir.map(Path::to_path_buf),
            env,
        })
    }
}

/// Run one pipeline to completion.
///
/// Configuration problems surface before anything is spawned. Staged
/// credentials are gone by the time this returns, on every path.
pub async fn run_pipeline(
    request: RunRequest<'_>,
    sink: &mut dyn RunSink,
    cancel: &mut CancelSignal,
) -> Result<RunResult> {
    let pipeline = request.pipeline;
    info!(
        pipeline = %pipeline.id,
        description = %pipeline.display_description(),
        tags = ?pipeline.effective_tags(),
        run_id = request.run_id,
        "starting pipeline"
    );

    sink.add_metadata(version_metadata());

    if let Some(root) = request.base_env.get(PROJECT_ROOT_VAR) {
        let message = project_root_warning(root, request.project_dir);
        warn!(pipeline = %pipeline.id, "{message}");
        sink.log(Level::Warning, &message);
    }

    let collected = collect_ssh_keys(pipeline);
    if collected.used_deprecated {
        warn!(pipeline = %pipeline.id, "{DEPRECATED_KEYS_WARNING}");
        sink.log(Level::Warning, DEPRECATED_KEYS_WARNING);
    }

    // Dropping the guard removes every staged file.
    let staging = SshStaging::stage(&collected.keys, request.lookup, sink)?;
    let spec = request.launch_spec(staging.as_ref().map(SshStaging::config_path))?;
    debug!(pipeline = %pipeline.id, argv = ?spec.argv, "launching meltano");

    let process = MeltanoProcess::spawn(&spec)?;

    let mut processor = LogProcessor::new(sink);
    let outcome = process
        .drive(cancel, |line| processor.process_line(line))
        .await;
    let result = processor.finish();

    drop(staging);

    match outcome? {
        RunnerOutcome::Exited(code) => {
            info!(
                pipeline = %pipeline.id,
                exit_code = code,
                errors = result.error_logs.len(),
                warnings = result.warning_logs.len(),
                "pipeline finished"
            );
            aggregate(code, result)
        }
        RunnerOutcome::Cancelled => {
            warn!(pipeline = %pipeline.id, "pipeline cancelled");
            Err(MeltrunError::Cancelled)
        }
    }
}

fn validate(pipeline: &Pipeline) -> Result<()> {
    if pipeline.extractor.name.trim().is_empty() {
        return Err(MeltrunError::config(format!(
            "Pipeline {} has no extractor name",
            pipeline.id
        )));
    }
    if pipeline.loader.name.trim().is_empty() {
        return Err(MeltrunError::config(format!(
            "Pipeline {} has no loader name",
            pipeline.id
        )));
    }
    Ok(())
}

fn project_root_warning(root: &str, project_dir: Option<&Path>) -> String {
    let configured = project_dir.map_or_else(
        || "(current directory)".to_string(),
        |dir| dir.display().to_string(),
    );
    format!(
        "Removing {PROJECT_ROOT_VAR} environment variable (value: {root}) \
         so meltano uses the configured project directory: {configured}"
    )
}

fn version_metadata() -> Map<String, Value> {
    let mut meta = Map::new();
    meta.insert(
        "meltrun_version".to_string(),
        Value::String(env!("CARGO_PKG_VERSION").to_string()),
    );
    meta
}
