// src/config/validate.rs

use std::collections::HashSet;
use std::path::Path;

use crate::config::model::{ProjectFile, RawProjectFile};
use crate::errors::{MeltrunError, Result};

impl TryFrom<RawProjectFile> for ProjectFile {
    type Error = MeltrunError;

    fn try_from(mut raw: RawProjectFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        raw.plugins.normalise_names();
        Ok(ProjectFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawProjectFile) -> Result<()> {
    ensure_has_pipelines(cfg)?;
    validate_pipeline_ids(cfg)?;
    validate_plugin_names(cfg)?;
    Ok(())
}

fn ensure_has_pipelines(cfg: &RawProjectFile) -> Result<()> {
    if cfg.pipeline.is_empty() {
        return Err(MeltrunError::config(
            "config must contain at least one [[pipeline]] section",
        ));
    }
    Ok(())
}

fn validate_pipeline_ids(cfg: &RawProjectFile) -> Result<()> {
    let mut seen = HashSet::new();
    for pipeline in &cfg.pipeline {
        if pipeline.id.trim().is_empty() {
            return Err(MeltrunError::config("pipeline id must not be empty"));
        }
        if !seen.insert(pipeline.id.as_str()) {
            return Err(MeltrunError::config(format!(
                "Pipeline ID {} is not unique",
                pipeline.id
            )));
        }
    }
    Ok(())
}

fn validate_plugin_names(cfg: &RawProjectFile) -> Result<()> {
    for pipeline in &cfg.pipeline {
        for (plugin_type, plugin) in pipeline.plugins() {
            if plugin.name.trim().is_empty() {
                return Err(MeltrunError::config(format!(
                    "pipeline '{}' has no {} name",
                    pipeline.id, plugin_type
                )));
            }
        }
    }
    Ok(())
}

/// Anchor a relative `project.dir` at the directory holding the config file.
pub(crate) fn resolve_project_dir(cfg: &mut ProjectFile, config_path: &Path) {
    let Some(dir) = cfg.project.dir.as_ref() else {
        return;
    };
    if dir.is_relative() {
        let base = config_path.parent().unwrap_or_else(|| Path::new(""));
        cfg.project.dir = Some(base.join(dir));
    }
}
