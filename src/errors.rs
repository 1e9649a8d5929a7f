// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::fmt;

use thiserror::Error;

use crate::logs::LogEntry;

/// Number of trailing error-log entries carried by a [`PipelineFailure`].
pub const ERROR_LOG_TAIL: usize = 5;

#[derive(Error, Debug)]
pub enum MeltrunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    PipelineFailed(#[from] PipelineFailure),

    #[error("Pipeline run cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MeltrunError {
    pub fn config(msg: impl Into<String>) -> Self {
        MeltrunError::ConfigError(msg.into())
    }
}

/// A child process that exited with a nonzero code.
///
/// Only the last [`ERROR_LOG_TAIL`] error entries are kept, so the report
/// stays bounded no matter how noisy the run was.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineFailure {
    pub exit_code: i32,
    pub error_logs: Vec<LogEntry>,
}

impl PipelineFailure {
    pub fn new(exit_code: i32, mut error_logs: Vec<LogEntry>) -> Self {
        if error_logs.len() > ERROR_LOG_TAIL {
            error_logs.drain(..error_logs.len() - ERROR_LOG_TAIL);
        }
        Self {
            exit_code,
            error_logs,
        }
    }
}

impl fmt::Display for PipelineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Meltano job failed (exit code: {})", self.exit_code)?;
        if !self.error_logs.is_empty() {
            write!(f, "\n\nMeltano error logs:")?;
            for entry in &self.error_logs {
                write!(f, "\n{entry}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for PipelineFailure {}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, MeltrunError>;
