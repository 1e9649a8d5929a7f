// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;
use crate::model::RunFlags;
use crate::types::StateStrategy;

/// Command-line arguments for `meltrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "meltrun",
    version,
    about = "Run meltano extract/load pipelines with resolved configuration and staged credentials.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the project file (TOML).
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Run only these pipelines, in the order given. Repeatable.
    ///
    /// Without it every pipeline in the file runs, in file order.
    #[arg(long = "pipeline", value_name = "ID")]
    pub pipelines: Vec<String>,

    /// Run id passed to `meltano run --run-id`. Defaults to a fresh UUID.
    #[arg(long, value_name = "ID")]
    pub run_id: Option<String>,

    /// Ignore saved state and extract everything.
    #[arg(long)]
    pub full_refresh: bool,

    /// Refresh the extractor catalog before running.
    #[arg(long)]
    pub refresh_catalog: bool,

    /// How new state combines with existing state (auto, merge, overwrite).
    #[arg(long, value_name = "STRATEGY", default_value_t = StateStrategy::Auto)]
    pub state_strategy: StateStrategy,

    /// Log level passed to meltano itself.
    #[arg(long, value_name = "LEVEL")]
    pub meltano_log_level: Option<String>,

    /// Stream selection patterns for the extractor. Repeatable.
    #[arg(long = "select-filter", value_name = "PATTERN")]
    pub select_filter: Vec<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `MELTRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate and print what would run, without launching meltano.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    pub fn run_flags(&self) -> RunFlags {
        RunFlags {
            full_refresh: self.full_refresh,
            refresh_catalog: self.refresh_catalog,
            state_strategy: self.state_strategy,
            log_level: self.meltano_log_level.clone(),
            select_filter: (!self.select_filter.is_empty()).then(|| self.select_filter.clone()),
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
