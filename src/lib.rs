// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod env;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod logs;
pub mod model;
pub mod ssh;
pub mod types;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cli::CliArgs;
use crate::config::{ProjectFile, load_and_validate};
use crate::engine::{RunRequest, run_pipeline};
use crate::env::{EnvMap, ProcessEnv};
use crate::errors::MeltrunError;
use crate::exec::CancelSignal;
use crate::logs::TracingSink;
use crate::model::{Pipeline, RunFlags};
use crate::ssh::collect_ssh_keys;

/// High-level entry point used by `main.rs`.
///
/// Loads the project file, picks the pipelines to run and runs them one
/// after another. The first failure stops the batch. Ctrl-C cancels the
/// pipeline currently running.
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    let selected = select_pipelines(&cfg, &args.pipelines)?;
    let flags = args.run_flags();
    let run_id = args
        .run_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let base_env = ProcessEnv::snapshot();

    if args.dry_run {
        for &pipeline in &selected {
            print_dry_run(&request(&cfg, pipeline, &flags, &run_id, &base_env))?;
        }
        debug!("dry-run complete (no execution)");
        return Ok(());
    }

    let (cancel_tx, mut cancel) = CancelSignal::channel();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            return;
        }
        let _ = cancel_tx.send(());
    });

    info!(run_id = %run_id, pipelines = selected.len(), "starting batch");

    for &pipeline in &selected {
        let mut sink = TracingSink::new(pipeline.id.clone());
        let req = request(&cfg, pipeline, &flags, &run_id, &base_env);
        let result = run_pipeline(req, &mut sink, &mut cancel)
            .await
            .with_context(|| format!("pipeline '{}'", pipeline.id))?;

        info!(
            pipeline = %pipeline.id,
            duration_seconds = ?result.duration_seconds,
            warnings = result.warning_logs.len(),
            "pipeline succeeded"
        );
    }

    Ok(())
}

fn request<'a>(
    cfg: &'a ProjectFile,
    pipeline: &'a Pipeline,
    flags: &'a RunFlags,
    run_id: &'a str,
    base_env: &'a EnvMap,
) -> RunRequest<'a> {
    RunRequest {
        pipeline,
        catalog: &cfg.plugins,
        flags,
        run_id,
        executable: cfg.executable(),
        project_dir: cfg.project_dir(),
        base_env,
        lookup: &ProcessEnv,
    }
}

/// Requested pipelines in request order, or all of them in file order.
fn select_pipelines<'c>(
    cfg: &'c ProjectFile,
    ids: &[String],
) -> std::result::Result<Vec<&'c Pipeline>, MeltrunError> {
    if ids.is_empty() {
        return Ok(cfg.pipeline.iter().collect());
    }
    ids.iter()
        .map(|id| {
            cfg.pipeline(id)
                .ok_or_else(|| MeltrunError::config(format!("unknown pipeline '{id}'")))
        })
        .collect()
}

/// Print argv and environment variable names, never values.
fn print_dry_run(request: &RunRequest<'_>) -> Result<()> {
    let pipeline = request.pipeline;
    let spec = request.launch_spec(None)?;
    let keys = collect_ssh_keys(pipeline);

    println!("pipeline {} ({})", pipeline.id, pipeline.display_description());
    println!("  argv: {}", spec.argv.join(" "));
    if let Some(dir) = spec.cwd.as_ref() {
        println!("  cwd: {}", dir.display());
    }
    if !keys.keys.is_empty() {
        println!("  ssh keys: {} (GIT_SSH_COMMAND set at run time)", keys.keys.len());
    }
    println!("  env:");
    for key in added_keys(request.base_env, &spec.env) {
        println!("    {key}");
    }
    Ok(())
}

/// Keys that differ from the inherited environment.
fn added_keys<'e>(base: &EnvMap, env: &'e EnvMap) -> impl Iterator<Item = &'e str> {
    env.iter()
        .filter(move |(k, v)| base.get(*k) != Some(*v))
        .map(|(k, _)| k.as_str())
}
