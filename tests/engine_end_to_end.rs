// tests/engine_end_to_end.rs
//
// Runs the whole engine against a shell script standing in for meltano.

#![cfg(unix)]

mod common;

use std::path::{Path, PathBuf};
use std::time::Duration;

use common::{FakeMeltano, PipelineBuilder, PluginBuilder, RecordingSink, init_tracing, with_timeout};
use meltrun::engine::{RunRequest, run_pipeline};
use meltrun::env::{EnvMap, MapEnv};
use meltrun::errors::MeltrunError;
use meltrun::exec::CancelSignal;
use meltrun::logs::{Level, LogEntry, LogEvent};
use meltrun::model::{KeySource, Pipeline, PluginCatalog, RunFlags};
use serde_json::json;

fn base_env() -> EnvMap {
    EnvMap::from([(
        "PATH".to_string(),
        std::env::var("PATH").unwrap_or_else(|_| "/usr/bin:/bin".to_string()),
    )])
}

struct Harness {
    pipeline: Pipeline,
    catalog: PluginCatalog,
    flags: RunFlags,
    base_env: EnvMap,
    lookup: MapEnv,
    project_dir: Option<PathBuf>,
}

impl Harness {
    fn new(pipeline: Pipeline) -> Self {
        init_tracing();
        Self {
            pipeline,
            catalog: PluginCatalog::default(),
            flags: RunFlags::default(),
            base_env: base_env(),
            lookup: MapEnv::new(),
            project_dir: None,
        }
    }

    fn request<'a>(&'a self, script: &'a str) -> RunRequest<'a> {
        RunRequest {
            pipeline: &self.pipeline,
            catalog: &self.catalog,
            flags: &self.flags,
            run_id: "test-run",
            executable: script,
            project_dir: self.project_dir.as_deref(),
            base_env: &self.base_env,
            lookup: &self.lookup,
        }
    }
}

fn csv_pipeline() -> Pipeline {
    PipelineBuilder::new("csv", "tap-csv", "target-jsonl")
        .extractor(PluginBuilder::new("tap-csv").literal("path", "/data/in.csv").build())
        .build()
}

#[tokio::test]
async fn successful_run_reports_duration_and_passes_env_and_argv() {
    let script = FakeMeltano::new(
        r#"echo "args: $*"
echo "path: $TAP_CSV_PATH format: $MELTANO_CLI_LOG_FORMAT"
echo '{"level": "warning", "event": "slow stream"}'
echo '{"level": "info", "event": "Run completed", "duration_seconds": 3.5}'
exit 0"#,
    );
    let harness = Harness::new(csv_pipeline());
    let exe = script.executable();
    let mut sink = RecordingSink::new();

    let result = with_timeout(run_pipeline(
        harness.request(&exe),
        &mut sink,
        &mut CancelSignal::never(),
    ))
    .await
    .unwrap();

    assert_eq!(result.duration_seconds, Some(3.5));
    assert_eq!(result.warning_logs, vec![LogEvent::new("warning", "slow stream")]);
    assert!(result.error_logs.is_empty());

    let info = sink.messages_at(Level::Info);
    assert!(info.contains(&"args: run --run-id=test-run tap-csv target-jsonl"));
    assert!(info.contains(&"path: /data/in.csv format: json"));

    let meta = sink.merged_metadata();
    assert_eq!(meta["meltrun_version"], json!(env!("CARGO_PKG_VERSION")));
    assert_eq!(meta["duration_seconds"], json!(3.5));
}

#[tokio::test]
async fn nonzero_exit_becomes_pipeline_failure() {
    let script = FakeMeltano::new(
        r#"echo '{"level": "error", "event": "Extractor failed", "code": 2}'
echo "Error: tap crashed" 1>&2
exit 1"#,
    );
    let harness = Harness::new(csv_pipeline());
    let exe = script.executable();
    let mut sink = RecordingSink::new();

    let err = with_timeout(run_pipeline(
        harness.request(&exe),
        &mut sink,
        &mut CancelSignal::never(),
    ))
    .await
    .unwrap_err();

    match err {
        MeltrunError::PipelineFailed(failure) => {
            assert_eq!(failure.exit_code, 1);
            assert_eq!(failure.error_logs.len(), 2);
            assert!(failure.error_logs.contains(&LogEntry::Record(
                LogEvent::new("error", "Extractor failed").with("code", 2)
            )));
            assert!(
                failure
                    .error_logs
                    .contains(&LogEntry::Text("Error: tap crashed".to_string()))
            );
            let shown = failure.to_string();
            assert!(shown.starts_with("Meltano job failed (exit code: 1)\n\nMeltano error logs:\n"));
        }
        other => panic!("expected PipelineFailed, got {other:?}"),
    }
    assert_eq!(sink.merged_metadata()["code"], json!(2));
}

#[tokio::test]
async fn failure_tail_keeps_last_five_errors() {
    let script = FakeMeltano::new(
        r#"for i in 1 2 3 4 5 6 7; do echo "{\"level\": \"error\", \"event\": \"e$i\"}"; done
exit 4"#,
    );
    let harness = Harness::new(csv_pipeline());
    let exe = script.executable();
    let mut sink = RecordingSink::new();

    let err = run_pipeline(harness.request(&exe), &mut sink, &mut CancelSignal::never())
        .await
        .unwrap_err();
    let MeltrunError::PipelineFailed(failure) = err else {
        panic!("expected PipelineFailed");
    };
    assert_eq!(failure.exit_code, 4);
    let events: Vec<String> = failure.error_logs.iter().map(|e| e.to_string()).collect();
    assert_eq!(
        events,
        (3..=7)
            .map(|i| format!(r#"{{"level":"error","event":"e{i}"}}"#))
            .collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn ssh_credentials_exist_during_run_and_are_removed_after() {
    let script = FakeMeltano::new(
        r#"cfg="${GIT_SSH_COMMAND#ssh -F }"
echo "config: $cfg"
if [ -f "$cfg" ]; then echo "config-present"; fi
exit 0"#,
    );
    let pipeline = PipelineBuilder::new("gh", "tap-github", "target-postgres")
        .loader(
            PluginBuilder::new("target-postgres")
                .ssh_key(KeySource::env("LOADER_KEY"))
                .build(),
        )
        .deprecated_key(KeySource::from("legacy-key"))
        .build();
    let mut harness = Harness::new(pipeline);
    harness.lookup = MapEnv::new().with("LOADER_KEY", "loader-key-content");
    let exe = script.executable();
    let mut sink = RecordingSink::new();

    run_pipeline(harness.request(&exe), &mut sink, &mut CancelSignal::never())
        .await
        .unwrap();

    let info = sink.messages_at(Level::Info);
    assert!(info.contains(&"Setting up SSH configuration for Git authentication"));
    assert!(info.contains(&"config-present"));
    let config = info
        .iter()
        .find_map(|m| m.strip_prefix("config: "))
        .expect("script printed its config path");
    let config = Path::new(config);
    assert!(!config.exists());
    assert!(!config.parent().unwrap().exists());

    let warnings = sink.messages_at(Level::Warning);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("git_ssh_private_keys is deprecated"));
}

#[tokio::test]
async fn unset_key_variable_aborts_before_spawn() {
    let marker_dir = tempfile::tempdir().unwrap();
    let marker = marker_dir.path().join("ran");
    let script = FakeMeltano::new(&format!("touch {}\nexit 0", marker.display()));
    let pipeline = PipelineBuilder::new("gh", "tap-github", "target-postgres")
        .extractor(
            PluginBuilder::new("tap-github")
                .ssh_key(KeySource::env("NOT_SET"))
                .build(),
        )
        .build();
    let harness = Harness::new(pipeline);
    let exe = script.executable();
    let mut sink = RecordingSink::new();

    let err = run_pipeline(harness.request(&exe), &mut sink, &mut CancelSignal::never())
        .await
        .unwrap_err();

    assert!(matches!(err, MeltrunError::ConfigError(_)));
    assert!(!marker.exists());
}

#[tokio::test]
async fn child_runs_in_project_dir() {
    let project = tempfile::tempdir().unwrap();
    let script = FakeMeltano::new("pwd");
    let mut harness = Harness::new(csv_pipeline());
    harness.project_dir = Some(project.path().to_path_buf());
    let exe = script.executable();
    let mut sink = RecordingSink::new();

    run_pipeline(harness.request(&exe), &mut sink, &mut CancelSignal::never())
        .await
        .unwrap();

    let expected = project.path().canonicalize().unwrap();
    let printed = sink
        .messages_at(Level::Info)
        .into_iter()
        .map(|m| PathBuf::from(m).canonicalize().ok())
        .any(|p| p.as_deref() == Some(expected.as_path()));
    assert!(printed);
}

#[tokio::test]
async fn cancellation_kills_child_and_removes_credentials() {
    let script = FakeMeltano::new(
        r#"echo "config: ${GIT_SSH_COMMAND#ssh -F }"
sleep 30
exit 0"#,
    );
    let pipeline = PipelineBuilder::new("gh", "tap-github", "target-postgres")
        .extractor(
            PluginBuilder::new("tap-github")
                .ssh_key(KeySource::from("extractor-key"))
                .build(),
        )
        .build();
    let harness = Harness::new(pipeline);
    let exe = script.executable();
    let mut sink = RecordingSink::new();

    let (tx, mut cancel) = CancelSignal::channel();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        let _ = tx.send(());
    });

    let err = with_timeout(run_pipeline(harness.request(&exe), &mut sink, &mut cancel))
        .await
        .unwrap_err();
    assert!(matches!(err, MeltrunError::Cancelled));

    let config = sink
        .messages_at(Level::Info)
        .into_iter()
        .find_map(|m| m.strip_prefix("config: ").map(PathBuf::from))
        .expect("script printed its config path");
    assert!(!config.exists());
    assert!(!config.parent().unwrap().exists());
}

#[tokio::test]
async fn inherited_project_root_is_stripped_with_a_warning() {
    let project = tempfile::tempdir().unwrap();
    let script = FakeMeltano::new(r#"echo "root: ${MELTANO_PROJECT_ROOT:-unset}""#);
    let mut harness = Harness::new(csv_pipeline());
    harness
        .base_env
        .insert("MELTANO_PROJECT_ROOT".into(), "/some/other/project".into());
    harness.project_dir = Some(project.path().to_path_buf());
    let exe = script.executable();
    let mut sink = RecordingSink::new();

    run_pipeline(harness.request(&exe), &mut sink, &mut CancelSignal::never())
        .await
        .unwrap();

    assert!(sink.messages_at(Level::Info).contains(&"root: unset"));
    let warnings = sink.messages_at(Level::Warning);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("(value: /some/other/project)"));
    assert!(warnings[0].ends_with(&format!(
        "configured project directory: {}",
        project.path().display()
    )));
}

#[tokio::test]
async fn last_run_completed_wins_across_stdout_and_stderr() {
    let script = FakeMeltano::new(
        r#"echo '{"level": "info", "event": "Run completed", "duration_seconds": 1.0}'
echo '{"level": "info", "event": "Run completed", "duration_seconds": 2.0}' 1>&2
echo '{"level": "info", "event": "Run completed", "duration_seconds": 3.0}'
echo '{"level": "info", "event": "Run completed", "duration_seconds": 4.0}' 1>&2
exit 0"#,
    );
    let harness = Harness::new(csv_pipeline());
    let exe = script.executable();
    let mut sink = RecordingSink::new();

    let result = run_pipeline(harness.request(&exe), &mut sink, &mut CancelSignal::never())
        .await
        .unwrap();

    assert_eq!(result.duration_seconds, Some(4.0));
}
