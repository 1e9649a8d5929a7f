// src/engine/outcome.rs

//! Turning an exit code plus accumulated logs into the run's verdict.

use crate::errors::{PipelineFailure, Result};
use crate::logs::RunResult;

/// Exit `0` keeps the accumulated result; anything else becomes a
/// [`PipelineFailure`] carrying the tail of the error log.
pub fn aggregate(exit_code: i32, result: RunResult) -> Result<RunResult> {
    if exit_code == 0 {
        Ok(result)
    } else {
        Err(PipelineFailure::new(exit_code, result.error_logs).into())
    }
}
